//! Resolve database credentials from the command line or a `my.cnf` style file.
//!
//! Format of the credentials file:
//! ```
//! let cnf = "
//! [client]
//! user=sensu
//! password=\"abcd1234\"
//! ";
//! let creds = mysql_query_check::credentials::parse_ini_str(cnf, "my.cnf").unwrap();
//! assert_eq!(creds.user, "sensu");
//! assert_eq!(creds.password, "abcd1234");
//! ```

use std::fmt;
use std::path::Path;

use ini::Ini;

use crate::CheckError;

const SECTION: &str = "client";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An ini file, when given, takes precedence over explicit values.
pub fn resolve(
    ini: Option<&Path>,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, CheckError> {
    match ini {
        Some(path) => parse_ini_file(path),
        None => Ok(Credentials {
            user: user.unwrap_or_default().to_owned(),
            password: password.unwrap_or_default().to_owned(),
        }),
    }
}

pub fn parse_ini_file(path: impl AsRef<Path>) -> Result<Credentials, CheckError> {
    let path = path.as_ref();
    let ini = Ini::load_from_file(path).map_err(|e| CheckError::config(path, e))?;
    from_client_section(&ini, path)
}

pub fn parse_ini_str(cnf: &str, origin: impl AsRef<Path>) -> Result<Credentials, CheckError> {
    let ini = Ini::load_from_str(cnf).map_err(|e| CheckError::config(origin.as_ref(), e))?;
    from_client_section(&ini, origin.as_ref())
}

fn from_client_section(ini: &Ini, path: &Path) -> Result<Credentials, CheckError> {
    let section = ini
        .section(Some(SECTION))
        .ok_or_else(|| CheckError::config(path, format!("missing [{SECTION}] section")))?;
    let key = |name: &str| {
        section.get(name).map(str::to_owned).ok_or_else(|| {
            CheckError::config(path, format!("missing `{name}` in [{SECTION}] section"))
        })
    };

    Ok(Credentials {
        user: key("user")?,
        password: key("password")?,
    })
}
