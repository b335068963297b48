//===========================================================================//

macro_rules! io_error {
    ($kind:ident, $e:expr) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::$kind, $e))
    };
    ($kind:ident, $fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::$kind,
                                         format!($fmt, $($arg)+)))
    };
}

/// Returns early with an `InvalidData` error; used when parsing bytes that
/// were supposed to be a well-formed ICO/BMP structure.
macro_rules! invalid_data {
    ($($arg:tt)+) => {
        io_error!(InvalidData, $($arg)+)
    };
}

/// Returns early with an `InvalidInput` error; used when asked to serialize
/// something that can't be represented.
macro_rules! invalid_input {
    ($($arg:tt)+) => {
        io_error!(InvalidInput, $($arg)+)
    };
}

//===========================================================================//
