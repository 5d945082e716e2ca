pub(crate) mod test_utils;

mod test_program;

#[cfg(feature = "collisions")]
mod test_collisions;

#[cfg(feature = "allow_filesystem")]
mod test_from_yaml;
