//! Learner and course context supplied by the embedding host.
//!
//! The host may run without a user service or outside a course (for example in a workbench),
//! so every accessor returns an `Option` rather than failing.

/// Identity of the learner the block is rendered for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    emails: Vec<String>,
}

impl Identity {
    /// Build an identity from the email addresses known to the host.
    ///
    /// Blank entries are dropped; returns `None` when no address remains.
    pub fn from_emails<I, S>(emails: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let emails = emails
            .into_iter()
            .map(|email| {
                let email: String = email.into();
                email.trim().to_string()
            })
            .filter(|email| !email.is_empty())
            .collect::<Vec<_>>();

        if emails.is_empty() {
            None
        } else {
            Some(Self { emails })
        }
    }

    /// All known email addresses, in the order the host reported them
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// The address used for a launch: the first one reported by the host
    pub fn email(&self) -> &str {
        &self.emails[0]
    }
}

/// Course the block usage belongs to
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct CourseRef {
    /// Course short name, e.g. `TestCourse`
    pub course: String,
    /// Course run, e.g. `201704`
    pub run: String,
}

impl CourseRef {
    /// Parse a course key in either the `course-v1:Org+Course+Run` or the legacy
    /// `Org/Course/Run` form.
    pub fn from_course_key(key: &str) -> Option<Self> {
        let key = key.trim();
        let parts = match key.strip_prefix("course-v1:") {
            Some(rest) => rest.split('+').collect::<Vec<_>>(),
            None => key.split('/').collect::<Vec<_>>(),
        };

        match parts.as_slice() {
            [org, course, run] if !org.is_empty() && !course.is_empty() && !run.is_empty() => {
                Some(Self::new(course.to_string(), run.to_string()))
            }
            _ => None,
        }
    }
}

/// Host services the launch needs to know who is asking and where
pub trait Runtime: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
    fn current_course(&self) -> Option<CourseRef>;
}

/// Runtime with a fixed identity and course
#[derive(Debug, Clone, Default, derive_new::new)]
pub struct StaticRuntime {
    identity: Option<Identity>,
    course: Option<CourseRef>,
}

impl Runtime for StaticRuntime {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    fn current_course(&self) -> Option<CourseRef> {
        self.course.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity_picks_first_email() {
        let identity =
            Identity::from_emails(["first@example.com", "second@example.com"]).unwrap();

        assert_eq!(identity.email(), "first@example.com");
        assert_eq!(identity.emails().len(), 2);
    }

    #[test]
    fn test_identity_requires_an_email() {
        assert_eq!(Identity::from_emails(Vec::<String>::new()), None);
        assert_eq!(Identity::from_emails(["", "  "]), None);
    }

    #[test]
    fn test_identity_skips_blank_entries() {
        let identity = Identity::from_emails(["", "learner@example.com"]).unwrap();

        assert_eq!(identity.email(), "learner@example.com");
    }

    #[rstest]
    #[case::opaque_key("course-v1:OpenCraft+TestCourse+201704")]
    #[case::legacy_key("OpenCraft/TestCourse/201704")]
    #[case::surrounding_whitespace(" course-v1:OpenCraft+TestCourse+201704 ")]
    fn test_course_from_key(#[case] key: &str) {
        assert_eq!(
            CourseRef::from_course_key(key),
            Some(CourseRef::new("TestCourse".to_string(), "201704".to_string()))
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::too_few_parts("course-v1:OpenCraft+TestCourse")]
    #[case::too_many_parts("OpenCraft/TestCourse/201704/extra")]
    #[case::empty_part("course-v1:OpenCraft++201704")]
    fn test_course_from_invalid_key(#[case] key: &str) {
        assert_eq!(CourseRef::from_course_key(key), None);
    }

    #[test]
    fn test_static_runtime_defaults_to_nothing() {
        let runtime = StaticRuntime::default();

        assert_eq!(runtime.current_identity(), None);
        assert_eq!(runtime.current_course(), None);
    }
}
