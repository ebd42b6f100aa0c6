use std::path::PathBuf;

use error_chain::error_chain;


error_chain! {

    types {
        Error, ErrorKind, ResultExt, Result;
    }

    foreign_links {
        GoogleAPI(google_drive3::Error);
        Io(std::io::Error);
        Logger(log::SetLoggerError);
        VarError(std::env::VarError);
    }

    errors {
        Authentication(reason: String) {
            description("authentication failed")
            display("Authentication failed: {}", reason)
        }
        NotADirectory(path: PathBuf) {
            description("local path is not a directory")
            display("{} is not a directory", path.display())
        }
        MissingField(field: &'static str) {
            description("drive response is missing a field")
            display("Drive response is missing the {} field", field)
        }
        InvalidMimeType(essence: String) {
            description("invalid mime type")
            display("Invalid mime type {}", essence)
        }
    }
}
