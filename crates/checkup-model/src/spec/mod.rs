mod checkup;
pub use checkup::CheckupSpec;
