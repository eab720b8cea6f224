use crate::debugger::address::{CodeAddress, DataAddress};
use crate::debugger::memory::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- resolution failures ---------------------------------------
    #[error("source file `{0}` not found")]
    FileNotFound(String),
    #[error("source file `{0}` is ambiguous, candidates: {1:?}")]
    AmbiguousFile(String, Vec<String>),
    #[error("no code at line {0} in file `{1}`")]
    LineNotFound(u32, String),
    #[error("function `{0}` not found")]
    FunctionNotFound(String),
    #[error("no source line for address {0}")]
    PlaceNotFound(CodeAddress),
    #[error("symbol `{0}` not found")]
    SymbolNotFound(String),
    #[error("breakpoint not found")]
    BreakpointNotFound,
    #[error("watch `{0}` not found")]
    WatchNotFound(String),
    #[error("watch `{0}` already exists")]
    WatchExists(String),
    #[error("frame number {0} not found")]
    FrameNotFound(u32),
    #[error("frame {0} is not a scripted frame")]
    FrameNotScripted(u32),
    #[error("plugin `{0}` not found")]
    PluginNotFound(String),
    #[error("plugin `{0}` was not loaded with debug information")]
    NoDebugInformation(String),

    // --------------------------------- bounds failures -------------------------------------------
    #[error("address {0} out of plugin's bounds")]
    OutOfBounds(DataAddress),
    #[error("index {index} out of range for `{symbol}`")]
    IndexOutOfRange { symbol: String, index: u32 },
    #[error("`{0}` is not an array")]
    NotAnArray(String),
    #[error("`{0}` is not a string")]
    NotAString(String),
    #[error("`{0}` is not a variable")]
    NotAVariable(String),

    // --------------------------------- protocol failures -----------------------------------------
    #[error("unsupported break info version {got} (supported up to {supported})")]
    UnsupportedVersion { got: u32, supported: u32 },

    // --------------------------------- input errors ----------------------------------------------
    #[error("invalid location `{0}`")]
    InvalidLocation(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error(transparent)]
    Format(#[from] FormatError),

    // --------------------------------- host errors -----------------------------------------------
    #[error("plugin is not being debugged")]
    NotActive,
    #[error("host: {0}")]
    Host(String),
}

impl Error {
    /// Return a hint to an interface - continue debugging after error or detach
    /// the debugger from the plugin.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::FileNotFound(_) => false,
            Error::AmbiguousFile(_, _) => false,
            Error::LineNotFound(_, _) => false,
            Error::FunctionNotFound(_) => false,
            Error::PlaceNotFound(_) => false,
            Error::SymbolNotFound(_) => false,
            Error::BreakpointNotFound => false,
            Error::WatchNotFound(_) => false,
            Error::WatchExists(_) => false,
            Error::FrameNotFound(_) => false,
            Error::FrameNotScripted(_) => false,
            Error::PluginNotFound(_) => false,
            Error::NoDebugInformation(_) => false,
            Error::OutOfBounds(_) => false,
            Error::IndexOutOfRange { .. } => false,
            Error::NotAnArray(_) => false,
            Error::NotAString(_) => false,
            Error::NotAVariable(_) => false,
            Error::InvalidLocation(_) => false,
            Error::InvalidNumber(_) => false,
            Error::Format(_) => false,
            Error::NotActive => false,
            Error::Host(_) => false,

            // the debug hook must be reverted
            Error::UnsupportedVersion { .. } => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                if $crate::log::is_enabled() {
                    $log_fn!(target: $crate::log::ENGINE_TARGET, "{:#}", e);
                }
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                if $crate::log::is_enabled() {
                    $log_fn!(target: $crate::log::ENGINE_TARGET, concat!($msg, " {:#}"), e);
                }
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
