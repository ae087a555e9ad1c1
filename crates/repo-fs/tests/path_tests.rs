use repo_fs::{NormalizedPath, validate_relative_name};
use rstest::rstest;

#[test]
fn test_normalize_backslashes_to_forward() {
    let path = NormalizedPath::new("foo\\bar\\baz");
    assert_eq!(path.as_str(), "foo/bar/baz");
}

#[test]
fn test_join_paths() {
    let base = NormalizedPath::new("out/public");
    let joined = base.join("p/acme/widget$abc.json");
    assert_eq!(joined.as_str(), "out/public/p/acme/widget$abc.json");
}

#[test]
fn test_join_cannot_escape_absolute_root() {
    let base = NormalizedPath::new("/srv");
    assert_eq!(base.join("../../etc").as_str(), "/etc");
}

#[rstest]
#[case("../x", "../x")]
#[case("a/../../x", "../x")]
#[case("../../x/y", "../../x/y")]
#[case("a/b/../../../x", "../x")]
#[case("/../x", "/x")]
#[case("/a/../../x", "/x")]
fn test_parent_components(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_onto_relative_parent() {
    let base = NormalizedPath::new("../public");
    assert_eq!(base.join("p/packages.json").as_str(), "../public/p/packages.json");
    assert_eq!(NormalizedPath::new("..").join("../x").as_str(), "../../x");
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("p/provider-acme$0f.json");
    assert_eq!(path.file_name(), Some("provider-acme$0f.json"));
    assert_eq!(path.extension(), Some("json"));
    assert_eq!(NormalizedPath::new("dir/.hidden").extension(), None);
}

#[test]
fn test_exists_false_for_nonexistent() {
    let path = NormalizedPath::new("/nonexistent/path/that/does/not/exist");
    assert!(!path.exists());
}

#[rstest]
#[case("packages.json")]
#[case("p/acme/widget$%hash%.json")]
#[case("p/provider-gitlab$0123.json")]
fn test_valid_relative_names(#[case] name: &str) {
    assert!(validate_relative_name(name).is_ok());
}

#[rstest]
#[case("")]
#[case("/etc/passwd")]
#[case("p/../../secret.json")]
#[case("p//double.json")]
#[case("p\\windows.json")]
#[case("./packages.json")]
fn test_invalid_relative_names(#[case] name: &str) {
    assert!(validate_relative_name(name).is_err());
}
