//! fuzzy-folder - folder picker backend for Neovim
//!
//! Lists folders under a base directory with `fd`, narrows them with
//! `fzf --filter` as the user types, and hands the results to the editor's
//! picker window. The Lua entry points live behind the `nvim` feature.

pub mod config;
pub mod decoder;
mod error;
pub mod events;
pub mod filter;
pub mod health;
pub mod lister;
pub mod picker;
pub mod process;
pub mod tracing_setup;
pub mod types;

use events::EventQueue;
use filter::FzfFilter;
use lister::FdLister;
use once_cell::sync::Lazy;
use picker::FolderPicker;
use std::sync::RwLock;

pub use config::{DecodeLimits, PickerConfig};
pub use decoder::decode_list;
pub use error::{Error, Result};
pub use picker::QuickPick;
pub use types::{BinaryHealth, PickerEvent, RawListing, RequestId};

pub type EditorPicker = FolderPicker<FdLister, FzfFilter, EventQueue>;

pub static PICKER: Lazy<RwLock<Option<EditorPicker>>> = Lazy::new(|| RwLock::new(None));

#[cfg(feature = "nvim")]
mod lua_api {
    use super::*;
    use mlua::prelude::*;
    use tracing::{error, info};

    fn with_picker<T>(f: impl FnOnce(&EditorPicker) -> LuaResult<T>) -> LuaResult<T> {
        let guard = PICKER.read().map_err(|_| Error::Poisoned("picker"))?;
        let picker = guard.as_ref().ok_or(Error::NotInitialized)?;
        f(picker)
    }

    pub fn setup(_: &Lua, config: PickerConfig) -> LuaResult<bool> {
        let picker = FolderPicker::from_config(config, EventQueue::new())?;
        let mut guard = PICKER.write().map_err(|_| Error::Poisoned("picker"))?;
        *guard = Some(picker);
        info!("fuzzy-folder is now active");
        Ok(true)
    }

    pub fn open(_: &Lua, _: ()) -> LuaResult<bool> {
        // Tool failures already reached the widget as an error event.
        with_picker(|picker| match picker.invoke() {
            Ok(_) => Ok(true),
            Err(e) if e.is_usage_error() => Err(e.into()),
            Err(_) => Ok(false),
        })
    }

    pub fn query(_: &Lua, text: String) -> LuaResult<u64> {
        with_picker(|picker| Ok(picker.on_input_change(&text)?.0))
    }

    pub fn accept(_: &Lua, selection: Option<String>) -> LuaResult<Option<String>> {
        with_picker(|picker| {
            let folder = picker.accept(selection.as_deref())?;
            Ok(folder.map(|path| path.to_string_lossy().into_owned()))
        })
    }

    pub fn dismiss(_: &Lua, _: ()) -> LuaResult<bool> {
        with_picker(|picker| Ok(picker.dismiss()))
    }

    pub fn poll(_: &Lua, _: ()) -> LuaResult<Vec<PickerEvent>> {
        with_picker(|picker| Ok(picker.widget().drain()))
    }

    pub fn is_picking(_: &Lua, _: ()) -> LuaResult<bool> {
        with_picker(|picker| Ok(picker.is_picking()))
    }

    pub fn health(_: &Lua, _: ()) -> LuaResult<Vec<BinaryHealth>> {
        let config = PICKER
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|picker| picker.config().clone()))
            .unwrap_or_default();
        Ok(health::check_binaries(&config))
    }

    pub fn init_tracing(_: &Lua, (log_file, level): (String, Option<String>)) -> LuaResult<String> {
        tracing_setup::init_tracing(&log_file, level.as_deref()).map_err(|e| {
            error!("Failed to initialize tracing: {}", e);
            e.into()
        })
    }
}

#[cfg(feature = "nvim")]
#[mlua::lua_module(skip_memory_check)]
fn fuzzy_folder_nvim(lua: &mlua::Lua) -> mlua::Result<mlua::Table> {
    let exports = lua.create_table()?;
    exports.set("setup", lua.create_function(lua_api::setup)?)?;
    exports.set("open", lua.create_function(lua_api::open)?)?;
    exports.set("query", lua.create_function(lua_api::query)?)?;
    exports.set("accept", lua.create_function(lua_api::accept)?)?;
    exports.set("dismiss", lua.create_function(lua_api::dismiss)?)?;
    exports.set("poll", lua.create_function(lua_api::poll)?)?;
    exports.set("is_picking", lua.create_function(lua_api::is_picking)?)?;
    exports.set("health", lua.create_function(lua_api::health)?)?;
    exports.set("init_tracing", lua.create_function(lua_api::init_tracing)?)?;
    Ok(exports)
}
