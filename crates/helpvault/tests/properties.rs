//! Property tests over the vault facade.

use std::collections::BTreeSet;

use proptest::prelude::*;

use helpvault::{ArticleId, PermissionKind, Role, VaultError};
use helpvault_testkit::generators::{permission_kind, plaintext, username};
use helpvault_testkit::TestFixture;

#[derive(Debug, Clone)]
enum Step {
    Grant(usize, PermissionKind),
    Revoke(usize, PermissionKind),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..4, permission_kind()).prop_map(|(u, k)| Step::Grant(u, k)),
        (0usize..4, permission_kind()).prop_map(|(u, k)| Step::Revoke(u, k)),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matrix_matches_set_model(
        users in prop::collection::btree_set(username(), 4),
        steps in prop::collection::vec(step(), 0..32),
    ) {
        let users: Vec<_> = users.into_iter().collect();
        runtime().block_on(async {
            let fixture = TestFixture::with_seed([0; 32]);
            let owner = fixture.register("owner-account", Role::INSTRUCTOR).await;
            let g = fixture.group("Props", &owner).await;
            let perms = fixture.vault.permissions();

            let mut model = BTreeSet::new();
            for step in &steps {
                match *step {
                    Step::Grant(u, kind) => {
                        let new = perms.grant(g.id, &users[u], kind).await.unwrap();
                        assert_eq!(new, model.insert((u, kind)));
                    }
                    Step::Revoke(u, kind) => {
                        let removed = perms.revoke(g.id, &users[u], kind).await.unwrap();
                        assert_eq!(removed, model.remove(&(u, kind)));
                    }
                }
            }

            for (u, name) in users.iter().enumerate() {
                for kind in PermissionKind::ALL {
                    assert_eq!(
                        perms.has(g.id, name, kind).await.unwrap(),
                        model.contains(&(u, kind))
                    );
                }
            }
        });
    }

    #[test]
    fn viewers_read_back_what_admins_wrote(body in plaintext(1024)) {
        runtime().block_on(async {
            let fixture = TestFixture::with_seed([1; 32]);
            let alice = fixture.register("alice", Role::INSTRUCTOR).await;
            let carol = fixture.register("carol", Role::STUDENT).await;
            let dave = fixture.register("dave", Role::STUDENT).await;
            let g = fixture.group("CS101", &alice).await;
            fixture.with_viewers(g.id, &[&carol]).await;

            let content = fixture.vault.content();
            content
                .put_article(g.id, ArticleId(1), &body, &alice.username)
                .await
                .unwrap();

            let read = content
                .get_article_content(g.id, ArticleId(1), &carol.username)
                .await
                .unwrap();
            assert_eq!(read, body);

            assert!(matches!(
                content
                    .get_article_content(g.id, ArticleId(1), &dave.username)
                    .await,
                Err(VaultError::AccessDenied)
            ));
        });
    }
}
