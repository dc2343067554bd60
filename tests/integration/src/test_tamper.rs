//! Any change to a signed component must break the MAC.

#[cfg(test)]
mod tests {
    use hawkstack_auth::error::AuthError;
    use hawkstack_auth::header::Header;
    use hawkstack_auth::request::RequestAttributes;

    use crate::{START, fixture};

    const HASH: [u8; 32] = [9; 32];
    const OTHER_HASH: [u8; 32] = [10; 32];

    fn original() -> RequestAttributes<'static> {
        RequestAttributes::new("PUT", "example.com", 443, "/resource/1?b=1&a=2")
            .with_hash(&HASH)
            .with_ext("app-data")
    }

    #[test]
    fn test_should_reject_each_altered_request_attribute() -> anyhow::Result<()> {
        let fx = fixture();

        let altered = [
            ("method", RequestAttributes { method: "POST", ..original() }),
            ("path", RequestAttributes { path: "/resource/1?b=1&a=3", ..original() }),
            ("host", RequestAttributes { host: "example.net", ..original() }),
            ("port", RequestAttributes { port: 444, ..original() }),
        ];

        for (index, (field, received)) in altered.iter().enumerate() {
            let signed = fx
                .client
                .header_with(&original(), START, &format!("nonce-{index}"))?;
            assert_eq!(
                fx.server.authenticate(received, &signed.authorization(), None),
                Err(AuthError::MacMismatch),
                "altered {field}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_should_reject_each_altered_header_field() -> anyhow::Result<()> {
        let fx = fixture();

        let mutations: [(&str, fn(&mut Header)); 4] = [
            ("ts", |h| h.ts = h.ts.map(|ts| ts + 1)),
            ("nonce", |h| h.nonce = Some("other".to_owned())),
            ("hash", |h| h.hash = Some(OTHER_HASH.to_vec())),
            ("ext", |h| h.ext = Some("app-datb".to_owned())),
        ];

        for (index, (field, mutate)) in mutations.iter().enumerate() {
            let signed = fx
                .client
                .header_with(&original(), START, &format!("nonce-{index}"))?;
            let mut header = signed.header.clone();
            mutate(&mut header);

            assert_eq!(
                fx.server
                    .authenticate(&original(), &header.to_header_value(), None),
                Err(AuthError::MacMismatch),
                "altered {field}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_should_reject_single_flipped_mac_bit() -> anyhow::Result<()> {
        let fx = fixture();
        let signed = fx.client.header_with(&original(), START, "flip")?;

        let mut header = signed.header.clone();
        if let Some(mac) = header.mac.as_mut() {
            mac[31] ^= 0x01;
        }
        assert_eq!(
            fx.server
                .authenticate(&original(), &header.to_header_value(), None),
            Err(AuthError::MacMismatch)
        );

        fx.server
            .authenticate(&original(), &signed.authorization(), None)?;
        Ok(())
    }

    #[test]
    fn test_should_reject_body_not_matching_signed_hash() -> anyhow::Result<()> {
        let fx = fixture();
        let signed = fx.client.header_with(&original(), START, "body")?;
        assert_eq!(
            fx.server
                .authenticate(&original(), &signed.authorization(), Some(&OTHER_HASH[..])),
            Err(AuthError::PayloadHashMismatch)
        );
        Ok(())
    }
}
