//! Bewit issuing and verification.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hawkstack_auth::bewit::append_bewit;
    use hawkstack_auth::error::AuthError;
    use hawkstack_auth::request::RequestAttributes;
    use hawkstack_core::Algorithm;

    use crate::{START, fixture, fixture_for};

    const PATH: &str = "/resource/4?filter=a";

    fn signed_url(fx: &crate::Fixture, ttl: u64) -> anyhow::Result<String> {
        let request = RequestAttributes::new("GET", "example.com", 443, PATH);
        let token = fx.client.bewit(&request, Duration::from_secs(ttl))?;
        Ok(append_bewit(PATH, &token))
    }

    #[test]
    fn test_should_accept_bewit_until_expiry_inclusive() -> anyhow::Result<()> {
        let fx = fixture();
        let url = signed_url(&fx, 60)?;
        let request = RequestAttributes::new("GET", "example.com", 443, &url);

        fx.clock.set(START + 60);
        let authenticated = fx.server.authenticate_bewit(&request)?;
        assert_eq!(authenticated.exp, START + 60);

        fx.clock.set(START + 61);
        assert_eq!(
            fx.server.authenticate_bewit(&request),
            Err(AuthError::BewitExpired)
        );
        Ok(())
    }

    #[test]
    fn test_should_verify_bewit_for_every_algorithm() -> anyhow::Result<()> {
        for algorithm in Algorithm::ALL {
            let fx = fixture_for(algorithm);
            let url = signed_url(&fx, 60)?;

            for method in ["GET", "HEAD"] {
                let request = RequestAttributes::new(method, "example.com", 443, &url);
                let authenticated = fx.server.authenticate_bewit(&request)?;
                assert_eq!(authenticated.credentials.key.algorithm(), algorithm);
            }
        }
        Ok(())
    }

    #[test]
    fn test_should_allow_repeated_use_without_nonce_state() -> anyhow::Result<()> {
        let fx = fixture();
        let url = signed_url(&fx, 300)?;
        let request = RequestAttributes::new("GET", "example.com", 443, &url);

        for _ in 0..3 {
            fx.server.authenticate_bewit(&request)?;
        }
        assert!(fx.server.guard().store().is_empty());
        Ok(())
    }

    #[test]
    fn test_should_reject_bewit_for_unsafe_methods() -> anyhow::Result<()> {
        let fx = fixture();
        let url = signed_url(&fx, 60)?;

        for method in ["POST", "PUT", "DELETE", "PATCH"] {
            let request = RequestAttributes::new(method, "example.com", 443, &url);
            assert_eq!(
                fx.server.authenticate_bewit(&request),
                Err(AuthError::MethodNotAllowed(method.to_owned()))
            );
        }
        Ok(())
    }

    #[test]
    fn test_should_reject_bewit_moved_to_other_resource() -> anyhow::Result<()> {
        let fx = fixture();
        let url = signed_url(&fx, 60)?;

        for (host, port, path) in [
            ("example.com", 443, url.replace("filter=a", "filter=b")),
            ("example.com", 8443, url.clone()),
            ("example.org", 443, url.clone()),
        ] {
            let request = RequestAttributes::new("GET", host, port, &path);
            assert_eq!(
                fx.server.authenticate_bewit(&request),
                Err(AuthError::MacMismatch),
                "{host}:{port}{path}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_should_reject_garbled_token() {
        let fx = fixture();
        let request = RequestAttributes::new("GET", "example.com", 443, "/resource?bewit=%%%");
        assert!(matches!(
            fx.server.authenticate_bewit(&request),
            Err(AuthError::MalformedBewit(_))
        ));
    }
}
