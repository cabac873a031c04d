//! Charset handling for text payloads carrying binary data.
//!
//! Some transports deliver a binary payload as text. The text is turned back
//! into bytes with the charset named by the content type. Labels resolve
//! through the WHATWG registry of `encoding_rs`, with two exceptions:
//!
//! - `ISO-8859-1` and `US-ASCII` keep their strict meaning. WHATWG aliases
//!   them to `windows-1252`, which has no byte for U+0080..U+009F.
//! - The `UTF-16` family is encoded here, since `encoding_rs` only decodes it.
//!   Plain `UTF-16` is written big-endian with a byte order mark.
//!
//! Unknown labels fall back to UTF-8. Characters the charset cannot represent
//! become `?`.

use encoding_rs::{EncoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// Charsets understood by [`encode_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8
    Utf8,
    /// ISO-8859-1, one byte per code point up to U+00FF
    Latin1,
    /// US-ASCII
    Ascii,
    /// UTF-16 in the given byte order
    Utf16 {
        /// Big-endian byte order
        big_endian: bool,
        /// Prefix a byte order mark
        bom: bool,
    },
    /// Any other charset known to `encoding_rs`
    Other(&'static Encoding),
}

impl Charset {
    /// Look up a charset by name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let label = name.trim().trim_matches('"');
        match label.to_ascii_lowercase().as_str() {
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "iso_8859_1" | "latin1" | "l1" => {
                return Some(Self::Latin1)
            }
            "us-ascii" | "ascii" => return Some(Self::Ascii),
            "utf-16" | "utf16" => {
                return Some(Self::Utf16 {
                    big_endian: true,
                    bom: true,
                })
            }
            _ => {}
        }

        let encoding = Encoding::for_label(label.as_bytes())?;
        if encoding == UTF_8 {
            Some(Self::Utf8)
        } else if encoding == UTF_16BE || encoding == UTF_16LE {
            Some(Self::Utf16 {
                big_endian: encoding == UTF_16BE,
                bom: false,
            })
        } else if encoding.output_encoding() == UTF_8 {
            // `replacement` and friends cannot encode at all
            None
        } else {
            Some(Self::Other(encoding))
        }
    }

    /// Determine the charset from a content type such as
    /// `text/plain; charset=ISO-8859-1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use octopus_ditto_mapper::charset::Charset;
    ///
    /// assert_eq!(Charset::from_content_type(Some("text/plain; charset=latin1")), Charset::Latin1);
    /// assert_eq!(Charset::from_content_type(Some("application/octet-stream")), Charset::Utf8);
    /// assert_eq!(Charset::from_content_type(None), Charset::Utf8);
    /// ```
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        content_type
            .into_iter()
            .flat_map(|ct| ct.split(';').skip(1))
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .and_then(|(_, value)| Self::from_name(value))
            .unwrap_or(Self::Utf8)
    }
}

/// Encode text into bytes using the given charset.
#[must_use]
pub fn encode_text(text: &str, charset: Charset) -> Vec<u8> {
    match charset {
        Charset::Utf8 => text.as_bytes().to_vec(),
        Charset::Latin1 => single_byte(text, 0xff),
        Charset::Ascii => single_byte(text, 0x7f),
        Charset::Utf16 { big_endian, bom } => {
            let mut out = Vec::with_capacity(2 * (text.len() + 1));
            for unit in bom.then_some(0xfeff).into_iter().chain(text.encode_utf16()) {
                let bytes = if big_endian {
                    unit.to_be_bytes()
                } else {
                    unit.to_le_bytes()
                };
                out.extend_from_slice(&bytes);
            }
            out
        }
        Charset::Other(encoding) => encode_with(text, encoding),
    }
}

fn single_byte(text: &str, max: u8) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c).ok().filter(|b| *b <= max).unwrap_or(b'?'))
        .collect()
}

fn encode_with(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut input = text;

    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(input, &mut out, true);
        input = &input[read..];
        match result {
            EncoderResult::InputEmpty => return out,
            EncoderResult::OutputFull => out.reserve(
                encoder
                    .max_buffer_length_from_utf8_without_replacement(input.len())
                    .unwrap_or(input.len() + 16),
            ),
            EncoderResult::Unmappable(_) => out.push(b'?'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_parameter_is_found_among_others() {
        assert_eq!(
            Charset::from_content_type(Some("text/plain; format=flowed; Charset=\"US-ASCII\"")),
            Charset::Ascii
        );
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        assert_eq!(
            Charset::from_content_type(Some("text/plain; charset=x-no-such-charset")),
            Charset::Utf8
        );
    }

    #[test]
    fn registry_labels_are_resolved() {
        assert_eq!(
            Charset::from_name("windows-1252"),
            Some(Charset::Other(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            Charset::from_name("ISO-8859-15"),
            Some(Charset::Other(encoding_rs::ISO_8859_15))
        );
        assert_eq!(
            Charset::from_name("KOI8-R"),
            Some(Charset::Other(encoding_rs::KOI8_R))
        );
        assert_eq!(
            Charset::from_name("UTF-16LE"),
            Some(Charset::Utf16 {
                big_endian: false,
                bom: false
            })
        );
    }

    #[test]
    fn latin1_maps_one_byte_per_char() {
        assert_eq!(
            encode_text("\u{0a}\u{80}\u{e9}\u{ff}", Charset::Latin1),
            vec![0x0a, 0x80, 0xe9, 0xff]
        );
        assert_eq!(encode_text("€", Charset::Latin1), vec![b'?']);
    }

    #[test]
    fn ascii_replaces_high_chars() {
        assert_eq!(encode_text("a\u{e9}", Charset::Ascii), vec![b'a', b'?']);
    }

    #[test]
    fn utf8_is_passthrough() {
        assert_eq!(encode_text("é", Charset::Utf8), "é".as_bytes());
    }

    #[test]
    fn windows_1252_encodes_euro_sign() {
        let charset = Charset::from_name("windows-1252").unwrap();
        assert_eq!(encode_text("a€", charset), vec![b'a', 0x80]);
        assert_eq!(encode_text("\u{4e2d}", charset), vec![b'?']);
    }

    #[test]
    fn iso_8859_15_differs_from_latin1() {
        let charset = Charset::from_name("ISO-8859-15").unwrap();
        assert_eq!(encode_text("€", charset), vec![0xa4]);
    }

    #[test]
    fn utf16_variants() {
        let plain = Charset::from_name("UTF-16").unwrap();
        assert_eq!(encode_text("A", plain), vec![0xfe, 0xff, 0x00, 0x41]);

        let little = Charset::from_name("utf-16le").unwrap();
        assert_eq!(encode_text("A€", little), vec![0x41, 0x00, 0xac, 0x20]);

        let big = Charset::from_name("utf-16be").unwrap();
        assert_eq!(encode_text("A", big), vec![0x00, 0x41]);
    }
}
