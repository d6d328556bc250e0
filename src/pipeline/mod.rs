pub mod cancel;
pub mod driver;
pub mod intake;
