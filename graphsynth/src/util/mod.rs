use internment::Intern;
use std::fmt::Display;
use std::ops::Deref;

pub mod bimap;

/// A cheaply copyable, globally interned string.
///
/// Labels and element names are compared constantly during recognition, so they are interned
/// once and compared by pointer afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub struct InternString(Intern<String>);

impl InternString {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialOrd for InternString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Deref for InternString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for InternString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Intern<String>> for InternString {
    fn from(value: Intern<String>) -> Self {
        InternString(value)
    }
}

impl<'a> From<&'a str> for InternString {
    fn from(value: &'a str) -> Self {
        InternString(Intern::<String>::from_ref(value))
    }
}

impl From<String> for InternString {
    fn from(value: String) -> Self {
        InternString(Intern::new(value))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for InternString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for InternString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(InternString::from(s))
    }
}

// The interning pool is append-only and thread-safe. It only ever holds label and name text,
// never engine state, so independent engines can share it.
#[macro_export]
macro_rules! interned_string_newtype {
    ($ty_name:ident) => {
        impl<'a> From<&'a str> for $ty_name {
            fn from(value: &'a str) -> Self {
                $ty_name($crate::util::InternString::from(value))
            }
        }

        impl From<String> for $ty_name {
            fn from(value: String) -> Self {
                $ty_name($crate::util::InternString::from(value))
            }
        }

        impl<'a> From<&'a String> for $ty_name {
            fn from(value: &'a String) -> Self {
                $ty_name($crate::util::InternString::from(value.as_str()))
            }
        }

        impl std::ops::Deref for $ty_name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.0.as_str()
            }
        }
    };
}

pub mod log {
    #[allow(unused)]
    macro_rules! trace { ($($x:tt)*) => (
        #[cfg(feature = "log")] {
            log_crate::trace!($($x)*)
        }
    ) }
    #[allow(unused)]
    macro_rules! debug { ($($x:tt)*) => (
        #[cfg(feature = "log")] {
            log_crate::debug!($($x)*)
        }
    ) }
    #[allow(unused)]
    macro_rules! info { ($($x:tt)*) => (
        #[cfg(feature = "log")] {
            log_crate::info!($($x)*);
        }
    ) }
    #[allow(unused)]
    macro_rules! warn2 { ($($x:tt)*) => (
        #[cfg(feature = "log")] {
            log_crate::warn!($($x)*)
        }
    ) }
    #[allow(unused)]
    macro_rules! error { ($($x:tt)*) => (
        #[cfg(feature = "log")] {
            log_crate::error!($($x)*)
        }
    ) }

    #[allow(unused)]
    pub(crate) use {debug, error, info, trace, warn2 as warn};
}
