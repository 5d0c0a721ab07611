pub mod awesome;

pub use awesome::AwesomeRateProvider;
