//! Avatar object naming.
//!
//! Uploads land at `<bucket>/<userId><randomSuffix>.<ext>`. The part after the
//! bucket is what gets stored in `user_metadata.avatar_url`. Every upload gets a
//! fresh name; old avatars are never overwritten or cleaned up.

/// Bucket avatars are uploaded to unless configured otherwise.
pub const DEFAULT_AVATARS_BUCKET: &str = "avatars";

/// Text after the last `.` of a file name.
///
/// A name without a dot yields the whole name.
pub fn file_extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Fresh avatar file name for `user_id`, keeping the extension of `original_name`.
pub fn avatar_file_name(user_id: &str, original_name: &str) -> String {
    let suffix: f64 = rand::random();
    format!("{user_id}{suffix}.{}", file_extension(original_name))
}

/// Full storage path of `file_name` inside `bucket`.
pub fn object_path(bucket: &str, file_name: &str) -> String {
    format!("{}/{}", bucket.trim_end_matches('/'), file_name)
}

/// Split a full storage path back into `(bucket, file_name)`.
pub fn split_object_path(path: &str) -> Option<(&str, &str)> {
    path.split_once('/').filter(|(b, f)| !b.is_empty() && !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("me.png"), "png");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "noext");
        assert_eq!(file_extension(".hidden"), "hidden");
    }

    #[test]
    fn test_avatar_file_name_shape() {
        let name = avatar_file_name("user-1", "portrait.JPG");
        assert!(name.starts_with("user-1"));
        assert!(name.ends_with(".JPG"));

        let suffix = &name["user-1".len()..name.len() - ".JPG".len()];
        let value: f64 = suffix.parse().unwrap();
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn test_avatar_file_names_differ() {
        assert_ne!(
            avatar_file_name("user-1", "a.png"),
            avatar_file_name("user-1", "a.png")
        );
    }

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("avatars", "u1.png"), "avatars/u1.png");
        assert_eq!(object_path("avatars/", "u1.png"), "avatars/u1.png");
        assert_eq!(split_object_path("avatars/u1.png"), Some(("avatars", "u1.png")));
        assert_eq!(split_object_path("u1.png"), None);
    }
}
