use std::fmt;
use std::sync::Arc;

/// Captured stdout of one scanner run. Shared read-only by every filter
/// request of the session that fetched it.
#[derive(Clone, PartialEq, Eq)]
pub struct RawListing(Arc<[u8]>);

impl RawListing {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawListing {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for RawListing {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for RawListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawListing")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Sequence number of a filter request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Widget updates queued for the editor shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    Show {
        items: Vec<String>,
    },
    Items {
        request: RequestId,
        query: String,
        items: Vec<String>,
    },
    Hide,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryHealth {
    pub program: String,
    pub available: bool,
    pub version: Option<String>,
    pub error: Option<String>,
}

#[cfg(feature = "nvim")]
mod lua {
    use super::*;
    use mlua::prelude::*;

    impl IntoLua for PickerEvent {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            match self {
                PickerEvent::Show { items } => {
                    table.set("kind", "show")?;
                    table.set("items", items)?;
                }
                PickerEvent::Items {
                    request,
                    query,
                    items,
                } => {
                    table.set("kind", "items")?;
                    table.set("request", request.0)?;
                    table.set("query", query)?;
                    table.set("items", items)?;
                }
                PickerEvent::Hide => {
                    table.set("kind", "hide")?;
                }
                PickerEvent::Error { message } => {
                    table.set("kind", "error")?;
                    table.set("message", message)?;
                }
            }
            Ok(LuaValue::Table(table))
        }
    }

    impl IntoLua for BinaryHealth {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            table.set("program", self.program)?;
            table.set("available", self.available)?;
            table.set("version", self.version)?;
            table.set("error", self.error)?;
            Ok(LuaValue::Table(table))
        }
    }
}
