pub mod cost;
pub mod run;
pub mod util;
pub mod validate;
