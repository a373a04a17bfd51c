//! Output file naming for the `<prefix>_<id>.jpg` convention.
//!
//! Every produced file gets a fresh random id so concurrent optimize calls
//! never collide. The id is a hyphenated v4 UUID; the prefix is caller-chosen
//! and may itself contain underscores, so parsing splits on the *last* one:
//! - `optimized_3f2b…e1.jpg` → prefix="optimized"
//! - `test_optimization_3f2b…e1.jpg` → prefix="test_optimization"

use uuid::Uuid;

/// Extension of every produced file.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Result of parsing a produced file name like `optimized_<uuid>.jpg`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutputName {
    pub prefix: String,
    pub id: Uuid,
}

/// Build the file name for a produced image.
pub fn output_file_name(prefix: &str, id: &Uuid) -> String {
    format!("{prefix}_{}.{OUTPUT_EXTENSION}", id.hyphenated())
}

/// A new, unique file name under `prefix`.
pub fn fresh_output_name(prefix: &str) -> String {
    output_file_name(prefix, &Uuid::new_v4())
}

/// Parse a file name produced by [`output_file_name`].
///
/// Returns `None` for anything else: wrong extension, no underscore, empty
/// prefix, or an id that is not a UUID.
pub fn parse_output_name(file_name: &str) -> Option<ParsedOutputName> {
    let stem = file_name.strip_suffix(OUTPUT_EXTENSION)?.strip_suffix('.')?;
    let (prefix, id) = stem.rsplit_once('_')?;
    if prefix.is_empty() {
        return None;
    }
    let id = Uuid::try_parse(id).ok()?;
    Some(ParsedOutputName {
        prefix: prefix.to_string(),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    fn id() -> Uuid {
        Uuid::parse_str(ID).unwrap()
    }

    #[test]
    fn output_name_format() {
        assert_eq!(
            output_file_name("optimized", &id()),
            format!("optimized_{ID}.jpg")
        );
    }

    #[test]
    fn fresh_names_are_unique() {
        let a = fresh_output_name("optimized");
        let b = fresh_output_name("optimized");
        assert_ne!(a, b);
        assert!(a.starts_with("optimized_"));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn parse_roundtrips_generated_name() {
        let parsed = parse_output_name(&output_file_name("optimized", &id())).unwrap();
        assert_eq!(parsed.prefix, "optimized");
        assert_eq!(parsed.id, id());
    }

    #[test]
    fn parse_prefix_with_underscores() {
        let name = format!("test_optimization_{ID}.jpg");
        let parsed = parse_output_name(&name).unwrap();
        assert_eq!(parsed.prefix, "test_optimization");
    }

    #[test]
    fn parse_rejects_foreign_names() {
        assert_eq!(parse_output_name("holiday.jpg"), None);
        assert_eq!(parse_output_name("optimized_notauuid.jpg"), None);
        assert_eq!(parse_output_name(&format!("optimized_{ID}.png")), None);
        assert_eq!(parse_output_name(&format!("_{ID}.jpg")), None);
        assert_eq!(parse_output_name(&format!("optimized_{ID}jpg")), None);
    }
}
