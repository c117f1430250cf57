//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent, `Err` when the value is not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
}
