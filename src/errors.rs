mod activation;
mod configuration;
mod operational;

pub use activation::ActivationErrorKind;
pub use configuration::ConfigurationErrorKind;
pub use operational::OperationalErrorKind;
