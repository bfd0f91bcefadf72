/// The command PayPal expects in front of the echoed IPN body when validating a message.
pub const NOTIFY_VALIDATE_CMD: &str = "cmd=_notify-validate";

/// Builds the validation request body: the command, followed by the original body verbatim. Field order and encoding
/// must not change, otherwise PayPal answers `INVALID`.
pub fn notify_validate_body(raw_body: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(NOTIFY_VALIDATE_CMD.len() + 1 + raw_body.len());
    body.extend_from_slice(NOTIFY_VALIDATE_CMD.as_bytes());
    if !raw_body.is_empty() {
        body.push(b'&');
        body.extend_from_slice(raw_body);
    }
    body
}
