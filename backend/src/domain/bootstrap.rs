//! First-boot provisioning: the default administrator and the default page
//! sections.
//!
//! Both steps are idempotent. The administrator is created only when no
//! account uses its email; sections are seeded only into an empty store.

use std::sync::Arc;

use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::{AuthService, SectionCommand, SectionQuery};
use crate::domain::{Error, NewSection, Registration, Role, SectionName};

/// Email of the provisioned administrator unless configured otherwise.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
/// Display name of the provisioned administrator.
pub const DEFAULT_ADMIN_NAME: &str = "Admin User";

/// Name, title and content of the sections a fresh site starts with.
pub const DEFAULT_SECTIONS: [(&str, &str, &str); 4] = [
    (
        "Hero Section",
        "Discover Your Inner Strength and Create A Life You Love",
        "We coaches will guide you through a transformational journey of self-discovery, \
         helping you identify your unique gifts and talents.",
    ),
    (
        "About Section",
        "Our Story",
        "At MiteshPatel, we believe in the limitless potential of individuals and the power \
         of collaboration to build lives we can all be proud of.",
    ),
    (
        "Services Section",
        "Our Core Coaching Services",
        "We offer a range of coaching services including Life Coaching, Business Coaching, \
         Business Consultancy, Mental Health, and Spiritual Awareness.",
    ),
    (
        "Team Section",
        "Meet Our Awesome Coach",
        "Our experienced coaches have helped thousands of individuals and businesses reach \
         their full potential.",
    ),
];

/// What to provision at startup.
#[derive(Debug, Clone)]
pub struct BootstrapPlan {
    pub admin_name: String,
    pub admin_email: String,
    /// `None` skips the administrator.
    pub admin_password: Option<Zeroizing<String>>,
    pub seed_sections: bool,
}

/// What provisioning actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub admin_created: bool,
    pub sections_seeded: usize,
}

/// Runs first-boot provisioning through the driving ports.
#[derive(Clone)]
pub struct Bootstrapper {
    auth: Arc<dyn AuthService>,
    section_query: Arc<dyn SectionQuery>,
    section_command: Arc<dyn SectionCommand>,
}

impl Bootstrapper {
    pub fn new(
        auth: Arc<dyn AuthService>,
        section_query: Arc<dyn SectionQuery>,
        section_command: Arc<dyn SectionCommand>,
    ) -> Self {
        Self {
            auth,
            section_query,
            section_command,
        }
    }

    /// Apply `plan`, skipping whatever already exists.
    pub async fn run(&self, plan: &BootstrapPlan) -> Result<BootstrapOutcome, Error> {
        let admin_created = match &plan.admin_password {
            Some(password) => self.ensure_admin(plan, password).await?,
            None => {
                info!(reason = "no password configured", "default admin skipped");
                false
            }
        };
        let sections_seeded = if plan.seed_sections {
            self.seed_sections().await?
        } else {
            0
        };
        Ok(BootstrapOutcome {
            admin_created,
            sections_seeded,
        })
    }

    async fn ensure_admin(&self, plan: &BootstrapPlan, password: &str) -> Result<bool, Error> {
        let registration =
            Registration::try_from_parts(&plan.admin_name, &plan.admin_email, password)
                .map_err(|err| Error::invalid_request(format!("bootstrap admin: {err}")))?
                .with_role(Role::Admin);

        match self.auth.register(registration).await {
            Ok(user) => {
                info!(user_id = %user.id(), email = %user.email(), "default admin created");
                Ok(true)
            }
            Err(err) if err.detail_code() == Some("email_taken") => {
                info!(email = %plan.admin_email, "default admin already present");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn seed_sections(&self) -> Result<usize, Error> {
        if !self.section_query.list().await?.is_empty() {
            info!("sections already present; default set skipped");
            return Ok(0);
        }

        for (name, title, content) in DEFAULT_SECTIONS {
            let name = SectionName::new(name)
                .map_err(|err| Error::internal(format!("default section name: {err}")))?;
            self.section_command
                .create(NewSection {
                    name,
                    title: title.to_owned(),
                    content: content.to_owned(),
                    order: None,
                    is_visible: Some(true),
                })
                .await?;
        }
        info!(count = DEFAULT_SECTIONS.len(), "default sections seeded");
        Ok(DEFAULT_SECTIONS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAuthService, MockSectionCommand, MockSectionQuery};
    use crate::domain::{EmailAddress, Section, SectionId, User, UserId, UserName};
    use crate::test_support::fixture_timestamp;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn plan() -> BootstrapPlan {
        BootstrapPlan {
            admin_name: DEFAULT_ADMIN_NAME.to_owned(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_owned(),
            admin_password: Some(Zeroizing::new("password123".to_owned())),
            seed_sections: true,
        }
    }

    fn admin() -> User {
        User::new(
            UserId::random(),
            UserName::new(DEFAULT_ADMIN_NAME).expect("name"),
            EmailAddress::new(DEFAULT_ADMIN_EMAIL).expect("email"),
            Role::Admin,
            fixture_timestamp(),
        )
    }

    fn created(section: NewSection) -> Section {
        Section {
            id: SectionId::random(),
            name: section.name,
            title: section.title,
            content: section.content,
            order: 0,
            is_visible: true,
            revision: 1,
            updated_at: fixture_timestamp(),
        }
    }

    fn bootstrapper(
        auth: MockAuthService,
        query: MockSectionQuery,
        command: MockSectionCommand,
    ) -> Bootstrapper {
        Bootstrapper::new(Arc::new(auth), Arc::new(query), Arc::new(command))
    }

    #[rstest]
    #[tokio::test]
    async fn fresh_store_gets_admin_and_four_sections(plan: BootstrapPlan) {
        let mut auth = MockAuthService::new();
        auth.expect_register()
            .withf(|registration| registration.role() == Role::Admin)
            .times(1)
            .return_once(|_| Ok(admin()));
        let mut query = MockSectionQuery::new();
        query.expect_list().return_once(|| Ok(Vec::new()));
        let mut command = MockSectionCommand::new();
        command
            .expect_create()
            .withf(|section| section.order.is_none())
            .times(4)
            .returning(|section| Ok(created(section)));

        let outcome = bootstrapper(auth, query, command)
            .run(&plan)
            .await
            .expect("bootstrap");

        assert_eq!(
            outcome,
            BootstrapOutcome {
                admin_created: true,
                sections_seeded: 4,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn existing_state_is_left_alone(plan: BootstrapPlan) {
        let mut auth = MockAuthService::new();
        auth.expect_register().return_once(|_| {
            Err(Error::invalid_request("User already exists")
                .with_details(json!({ "code": "email_taken" })))
        });
        let mut query = MockSectionQuery::new();
        query.expect_list().return_once(|| {
            Ok(vec![created(NewSection {
                name: SectionName::new("Hero Section").expect("name"),
                title: String::new(),
                content: String::new(),
                order: None,
                is_visible: None,
            })])
        });
        let mut command = MockSectionCommand::new();
        command.expect_create().never();

        let outcome = bootstrapper(auth, query, command)
            .run(&plan)
            .await
            .expect("bootstrap");

        assert_eq!(outcome, BootstrapOutcome::default());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_password_skips_admin(mut plan: BootstrapPlan) {
        plan.admin_password = None;
        plan.seed_sections = false;
        let mut auth = MockAuthService::new();
        auth.expect_register().never();

        let outcome = bootstrapper(auth, MockSectionQuery::new(), MockSectionCommand::new())
            .run(&plan)
            .await
            .expect("bootstrap");

        assert_eq!(outcome, BootstrapOutcome::default());
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_propagate(plan: BootstrapPlan) {
        let mut auth = MockAuthService::new();
        auth.expect_register()
            .return_once(|_| Err(Error::service_unavailable("credential store down")));

        let err = bootstrapper(auth, MockSectionQuery::new(), MockSectionCommand::new())
            .run(&plan)
            .await
            .expect_err("failure");

        assert_eq!(err.code(), crate::domain::ErrorCode::ServiceUnavailable);
    }
}
