//! Timestamp window and nonce replay behavior under a manual clock.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use hawkstack_auth::error::AuthError;
    use hawkstack_auth::replay::NonceSweeper;
    use hawkstack_auth::request::RequestAttributes;

    use crate::{START, WINDOW, fixture};

    fn request() -> RequestAttributes<'static> {
        RequestAttributes::new("GET", "example.com", 443, "/resource")
    }

    #[test]
    fn test_should_reject_replay_within_window() -> anyhow::Result<()> {
        let fx = fixture();
        let authorization = fx.client.header(&request())?.authorization();

        fx.server.authenticate(&request(), &authorization, None)?;
        fx.clock.advance(30);
        assert_eq!(
            fx.server.authenticate(&request(), &authorization, None),
            Err(AuthError::ReplayedNonce)
        );
        Ok(())
    }

    #[test]
    fn test_should_accept_reused_nonce_after_window_and_sweep() -> anyhow::Result<()> {
        let fx = fixture();
        let first = fx.client.header_with(&request(), START, "reused")?;
        fx.server.authenticate(&request(), &first.authorization(), None)?;

        fx.clock.advance(61);
        assert_eq!(fx.server.guard().sweep(START + 61), 1);
        assert!(fx.server.guard().store().is_empty());

        let second = fx.client.header_with(&request(), START + 61, "reused")?;
        fx.server.authenticate(&request(), &second.authorization(), None)?;
        assert_eq!(fx.server.guard().store().len(), 1);
        Ok(())
    }

    #[test]
    fn test_should_replace_expired_record_without_sweep() -> anyhow::Result<()> {
        let fx = fixture();
        let first = fx.client.header_with(&request(), START, "reused")?;
        fx.server.authenticate(&request(), &first.authorization(), None)?;

        fx.clock.advance(61);
        let second = fx.client.header_with(&request(), START + 61, "reused")?;
        fx.server.authenticate(&request(), &second.authorization(), None)?;
        Ok(())
    }

    #[test]
    fn test_should_treat_window_boundary_as_inclusive() -> anyhow::Result<()> {
        let fx = fixture();
        let window = i64::try_from(WINDOW)?;

        for (offset, nonce) in [(-window, "past-edge"), (window, "future-edge")] {
            let signed = fx.client.header_with(&request(), START + offset, nonce)?;
            fx.server.authenticate(&request(), &signed.authorization(), None)?;
        }

        for (offset, nonce) in [(-window - 1, "past-stale"), (window + 1, "future-stale")] {
            let signed = fx.client.header_with(&request(), START + offset, nonce)?;
            assert_eq!(
                fx.server.authenticate(&request(), &signed.authorization(), None),
                Err(AuthError::StaleTimestamp { now: START })
            );
        }
        Ok(())
    }

    #[test]
    fn test_should_accept_exactly_one_concurrent_submission() -> anyhow::Result<()> {
        const THREADS: usize = 16;

        let fx = Arc::new(fixture());
        let authorization = Arc::new(fx.client.header(&request())?.authorization());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let fx = Arc::clone(&fx);
                let authorization = Arc::clone(&authorization);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    fx.server.authenticate(&request(), &authorization, None)
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.join().expect("authentication thread panicked") {
                Ok(_) => accepted += 1,
                Err(error) => assert_eq!(error, AuthError::ReplayedNonce),
            }
        }
        assert_eq!(accepted, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_purge_expired_nonces_in_background() -> anyhow::Result<()> {
        let fx = fixture();
        for nonce in ["a", "b", "c"] {
            let signed = fx.client.header_with(&request(), START, nonce)?;
            fx.server.authenticate(&request(), &signed.authorization(), None)?;
        }
        assert_eq!(fx.server.guard().store().len(), 3);

        let sweeper = NonceSweeper::spawn(
            fx.server.guard().clone(),
            fx.server.clock().clone(),
            Duration::from_millis(5),
        );

        fx.clock.advance(30);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(fx.server.guard().store().len(), 3);

        fx.clock.advance(31);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(fx.server.guard().store().is_empty());

        sweeper.shutdown().await;
        Ok(())
    }
}
