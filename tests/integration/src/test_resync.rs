//! Clock resynchronization after a stale-timestamp rejection.

#[cfg(test)]
mod tests {
    use hawkstack_auth::client::Client;
    use hawkstack_auth::error::AuthError;
    use hawkstack_auth::request::RequestAttributes;
    use hawkstack_core::{ManualClock, Timestamp};

    use crate::{START, fixture};

    fn request() -> RequestAttributes<'static> {
        RequestAttributes::new("GET", "example.com", 443, "/resource")
    }

    #[test]
    fn test_should_recover_from_skewed_client_clock() -> anyhow::Result<()> {
        let fx = fixture();
        let skewed: Timestamp = START - 3600;
        let client = Client::new(fx.credentials.clone())
            .with_clock(std::sync::Arc::new(ManualClock::new(skewed)));

        let authorization = client.header(&request())?.authorization();
        let error = fx
            .server
            .authenticate(&request(), &authorization, None)
            .unwrap_err();
        assert_eq!(error, AuthError::StaleTimestamp { now: START });

        let challenge = fx.server.challenge(&error, Some(&authorization));
        assert_eq!(client.resync(&challenge)?, 3600);

        let authorization = client.header(&request())?.authorization();
        fx.server.authenticate(&request(), &authorization, None)?;
        Ok(())
    }

    #[test]
    fn test_should_ignore_challenge_signed_with_other_key() -> anyhow::Result<()> {
        let fx = fixture();
        let other = crate::fixture();

        let stale = other.client.header_with(&request(), START - 3600, "n")?;
        let error = other
            .server
            .authenticate(&request(), &stale.authorization(), None)
            .unwrap_err();
        let challenge = other.server.challenge(&error, Some(&stale.authorization()));

        assert!(matches!(
            fx.client.resync(&challenge),
            Err(AuthError::ResponseAuthFailed(_))
        ));
        assert_eq!(fx.client.offset(), 0);
        Ok(())
    }
}
