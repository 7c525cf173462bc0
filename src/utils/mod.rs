pub mod code_generator;
pub mod jwt;

pub use code_generator::generate_six_digit_code;
pub use jwt::*;
