//! Prompts that must not echo what the user types.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// Read a password from the terminal without echoing it.
pub fn read_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt)
        .map_err(|err| Error::io("failed to read password from terminal", err))
}

/// Read a password from `reader`, writing only the prompt to `writer`.
pub fn read_password_from<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
) -> Result<String> {
    rpassword::prompt_password_from_bufread(reader, writer, prompt)
        .map_err(|err| Error::io("failed to read password", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_echoed() {
        let mut input = "correct horse\n".as_bytes();
        let mut output = Vec::new();
        let password = read_password_from(&mut input, &mut output, "Password: ").unwrap();
        assert_eq!(password, "correct horse");
        assert_eq!(String::from_utf8(output).unwrap(), "Password: ");
    }
}
