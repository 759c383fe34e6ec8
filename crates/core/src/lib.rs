pub mod external;
pub mod shared;
pub mod speech;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;
