//! `docker login` command construction

use crate::docker::escape::escape;
use crate::docker::version::VersionDescriptor;
use crate::registry::RegistryCredential;

const PASSWORD_FLAG: &str = "--password ";
const FILTERED: &str = "[FILTERED]";

/// Builds one login command per registry
#[derive(Debug, Clone)]
pub struct LoginCommandBuilder {
    binary: String,
    placeholder_email: String,
}

impl LoginCommandBuilder {
    pub fn new(binary: impl Into<String>, placeholder_email: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            placeholder_email: placeholder_email.into(),
        }
    }

    /// Render the login command for `credential`.
    ///
    /// Username, password and host are escaped exactly once. `--email` is
    /// added for releases before 17 and whenever the version is unknown.
    pub fn build(&self, credential: &RegistryCredential, version: VersionDescriptor) -> String {
        let mut command = format!(
            "{} login --username {} --password {}",
            self.binary,
            escape(&credential.username),
            escape(&credential.password)
        );

        if version.requires_email() {
            let email = credential
                .email
                .as_deref()
                .unwrap_or(&self.placeholder_email);
            command.push_str(" --email ");
            command.push_str(&escape(email));
        }

        command.push(' ');
        command.push_str(&escape(&credential.host));
        command
    }
}

impl Default for LoginCommandBuilder {
    fn default() -> Self {
        Self::new("docker", "no@example.com")
    }
}

/// Mask the value following `--password` so a command can be echoed.
///
/// The value ends at the first space not preceded by a backslash.
pub fn redact_password(command: &str) -> String {
    let Some(start) = command.find(PASSWORD_FLAG) else {
        return command.to_string();
    };
    let value_start = start + PASSWORD_FLAG.len();

    let mut value_end = command.len();
    let mut escaped = false;
    for (i, c) in command[value_start..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ' ' => {
                value_end = value_start + i;
                break;
            }
            _ => {}
        }
    }

    format!(
        "{}{}{}",
        &command[..value_start],
        FILTERED,
        &command[value_end..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> RegistryCredential {
        RegistryCredential::new("ba+z.com", "fo+o", "ba+r")
    }

    #[test]
    fn old_version_uses_email_flag() {
        let cmd = LoginCommandBuilder::default()
            .build(&credential(), VersionDescriptor::Known { major: 1 });
        assert_eq!(
            cmd,
            "docker login --username fo\\+o --password ba\\+r --email no@example.com ba\\+z.com"
        );
    }

    #[test]
    fn unknown_version_uses_email_flag() {
        let cmd = LoginCommandBuilder::default().build(&credential(), VersionDescriptor::Unknown);
        assert_eq!(
            cmd,
            "docker login --username fo\\+o --password ba\\+r --email no@example.com ba\\+z.com"
        );
    }

    #[test]
    fn new_version_omits_email_flag() {
        let cmd = LoginCommandBuilder::default()
            .build(&credential(), VersionDescriptor::Known { major: 17 });
        assert_eq!(cmd, "docker login --username fo\\+o --password ba\\+r ba\\+z.com");
    }

    #[test]
    fn credential_email_overrides_placeholder() {
        let cred = credential().with_email("ops@example.com");
        let cmd = LoginCommandBuilder::default().build(&cred, VersionDescriptor::Unknown);
        assert!(cmd.contains("--email ops@example.com"));
        assert!(!cmd.contains("no@example.com"));
    }

    #[test]
    fn custom_binary() {
        let cmd = LoginCommandBuilder::new("podman", "no@example.com")
            .build(&credential(), VersionDescriptor::Known { major: 24 });
        assert!(cmd.starts_with("podman login "));
    }

    #[test]
    fn never_double_escapes() {
        let cmd = LoginCommandBuilder::default()
            .build(&credential(), VersionDescriptor::Known { major: 24 });
        assert!(!cmd.contains("\\\\"));
    }

    // ---- redact_password tests ----

    #[test]
    fn redacts_password_value() {
        let cmd = "docker login --username fo\\+o --password ba\\+r ba\\+z.com";
        assert_eq!(
            redact_password(cmd),
            "docker login --username fo\\+o --password [FILTERED] ba\\+z.com"
        );
    }

    #[test]
    fn redacts_password_with_escaped_space() {
        let cmd = "docker login --username u --password a\\ b --email no@example.com host";
        assert_eq!(
            redact_password(cmd),
            "docker login --username u --password [FILTERED] --email no@example.com host"
        );
    }

    #[test]
    fn redact_leaves_other_commands() {
        assert_eq!(redact_password("cd foo"), "cd foo");
    }
}
