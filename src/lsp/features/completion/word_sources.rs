//! Word sources feeding the index: the built-in word list and the user
//! dictionary (inline setting or external file).
//!
//! The external user dictionary lives at a fixed file name under the per-user
//! config directory:
//! - Linux: ~/.config/dict-completion/wordlist
//! - macOS: ~/Library/Application Support/dict-completion/wordlist
//! - Windows: %APPDATA%\dict-completion\wordlist

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::lsp::features::traits::SettingsStore;

/// Word list compiled into the binary.
pub const BUILTIN_WORD_LIST: &str = include_str!("../../../../data/words");

const APP_DIR_NAME: &str = "dict-completion";
const USER_DICT_FILE_NAME: &str = "wordlist";

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("unable to determine the user config directory")]
    NoConfigDir,

    #[error("failed to read word list {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create user dictionary {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Splits raw word list text into lines (`\n` or `\r\n`), without trimming.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Loads the built-in words, from `path` when given, else the compiled-in list.
pub fn load_builtin_words(path: Option<&Path>) -> Result<Vec<String>, DictionaryError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| DictionaryError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(parse_word_list(&text))
        }
        None => Ok(parse_word_list(BUILTIN_WORD_LIST)),
    }
}

/// Default location of the external user dictionary.
pub fn default_user_dict_path() -> Result<PathBuf, DictionaryError> {
    let config_dir = dirs::config_dir().ok_or(DictionaryError::NoConfigDir)?;
    Ok(config_dir.join(APP_DIR_NAME).join(USER_DICT_FILE_NAME))
}

/// Reads the external user dictionary. A missing file is an empty list.
pub fn read_user_dictionary(path: &Path) -> Result<Vec<String>, DictionaryError> {
    match fs::read_to_string(path) {
        Ok(text) if text.is_empty() => Ok(Vec::new()),
        Ok(text) => Ok(parse_word_list(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("User dictionary {:?} does not exist yet", path);
            Ok(Vec::new())
        }
        Err(source) => Err(DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Creates an empty user dictionary (and its directory) if absent.
///
/// Returns `true` when the file was created.
pub fn ensure_user_dictionary(path: &Path) -> Result<bool, DictionaryError> {
    if path.exists() {
        return Ok(false);
    }
    let create_err = |source| DictionaryError::Create {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(create_err)?;
    }
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(create_err)?;
    Ok(true)
}

/// Case-insensitive path comparison used to recognise saves of the user dictionary.
pub fn is_user_dictionary(candidate: &Path, user_dict_path: &Path) -> bool {
    candidate.to_string_lossy().to_lowercase() == user_dict_path.to_string_lossy().to_lowercase()
}

/// Collects the user words the current settings point at.
///
/// In external-file mode the file at `user_dict_path` is read; otherwise the
/// inline `userDictionary` setting is used.
pub fn collect_user_words<S>(
    settings: &S,
    user_dict_path: Option<&Path>,
) -> Result<Vec<String>, DictionaryError>
where
    S: SettingsStore + ?Sized,
{
    if !settings.external_user_dict_file() {
        return Ok(settings.user_dictionary().to_vec());
    }
    match user_dict_path {
        Some(path) => read_user_dictionary(path),
        None => Err(DictionaryError::NoConfigDir),
    }
}
