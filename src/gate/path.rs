/// Canonical form of a request path.
///
/// The route table classifies this path and the upstream receives the same
/// one:
///
/// * percent-encoded unreserved characters (`A-Z a-z 0-9 - . _ ~`) are
///   decoded, other escapes are kept with upper-case hex;
/// * repeated `/` collapse into one;
/// * `.` and `..` segments are resolved, `..` never climbs above the root.
///
/// A trailing `/` is kept. The result always starts with `/`.
pub fn canonicalize(path: &str) -> String {
    let decoded = decode_unreserved(path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut canonical = String::with_capacity(decoded.len() + 1);
    for segment in segments.iter() {
        canonical.push('/');
        canonical.push_str(segment);
    }

    let trailing = decoded.ends_with('/')
        || decoded.ends_with("/.")
        || decoded.ends_with("/..");
    if canonical.is_empty() || trailing {
        canonical.push('/');
    }
    canonical
}

fn decode_unreserved(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let byte = (hi << 4) | lo;
                if is_unreserved(byte) {
                    out.push(byte);
                } else {
                    out.push(b'%');
                    out.push(bytes[i + 1].to_ascii_uppercase());
                    out.push(bytes[i + 2].to_ascii_uppercase());
                }
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    // Only ASCII bytes were substituted, the input was valid UTF-8.
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}
