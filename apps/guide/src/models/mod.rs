pub mod notification;
pub mod place;
pub mod plan;
pub mod review;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Treats a JSON `null` the same as a missing field and yields `T::default()`.
/// The backend returns `null` for empty array columns such as `images`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
