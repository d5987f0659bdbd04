use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LeapsError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        LeapsError::synthesis("x")
            .to_string()
            .contains("synthesis error:")
    );
    assert!(LeapsError::render("x").to_string().contains("render error:"));
    assert!(
        LeapsError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
}

#[test]
fn kind_matches_variant() {
    assert_eq!(
        LeapsError::configuration("x").kind(),
        ErrorKind::Configuration
    );
    assert_eq!(LeapsError::synthesis("x").kind(), ErrorKind::Synthesis);
    assert_eq!(LeapsError::render("x").kind(), ErrorKind::Render);
    assert_eq!(LeapsError::encoding("x").kind(), ErrorKind::Encoding);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LeapsError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn prefix_keeps_kind() {
    let err = LeapsError::synthesis("unsupported voice language 'xx'").with_prefix("slide 3");
    assert_eq!(err.kind(), ErrorKind::Synthesis);
    assert_eq!(
        err.to_string(),
        "synthesis error: slide 3: unsupported voice language 'xx'"
    );

    let other = LeapsError::Other(anyhow::anyhow!("disk")).with_prefix("slide 1");
    assert_eq!(other.kind(), ErrorKind::Other);
    assert_eq!(format!("{other:#}"), "slide 1: disk");
}
