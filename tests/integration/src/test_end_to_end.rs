//! Client to server round trips.

#[cfg(test)]
mod tests {
    use hawkstack_auth::payload::PayloadHasher;
    use hawkstack_auth::request::RequestAttributes;
    use hawkstack_auth::server::ResponseOptions;
    use hawkstack_auth::transport::{SERVER_AUTHORIZATION, authenticate_parts, sign_request};
    use hawkstack_core::Algorithm;
    use http::header::{AUTHORIZATION, HeaderValue};
    use http::{Request, Response};

    use crate::{ID, START, fixture, fixture_for};

    #[test]
    fn test_should_authenticate_request_and_response() -> anyhow::Result<()> {
        for algorithm in Algorithm::ALL {
            let fx = fixture_for(algorithm);
            let request = RequestAttributes::new("GET", "example.com", 443, "/resource");

            let signed = fx.client.header_with(&request, START, "j4h3g2")?;
            assert_eq!(
                signed.header.mac.as_ref().map(Vec::len),
                Some(algorithm.output_len())
            );
            let authenticated = fx
                .server
                .authenticate(&request, &signed.authorization(), None)?;
            assert_eq!(authenticated.credentials.id, ID);
            assert_eq!(authenticated.artifacts, signed.artifacts);

            let server_authorization =
                fx.server
                    .response_header(&authenticated, &request, &ResponseOptions::default())?;
            fx.client.authenticate_response(
                &request,
                &signed.artifacts,
                &server_authorization,
                None,
            )?;
        }
        Ok(())
    }

    #[test]
    fn test_should_authenticate_payload_both_ways() -> anyhow::Result<()> {
        for algorithm in Algorithm::ALL {
            authenticate_payload_both_ways(algorithm)?;
        }
        Ok(())
    }

    fn authenticate_payload_both_ways(algorithm: Algorithm) -> anyhow::Result<()> {
        let fx = fixture_for(algorithm);
        let body = br#"{"name":"hawk"}"#;
        let request_hash = PayloadHasher::hash("application/json", algorithm, body);
        let request = RequestAttributes::new("POST", "example.com", 8080, "/items?draft=true")
            .with_hash(&request_hash)
            .with_ext("trace=abc");

        let signed = fx.client.header(&request)?;

        let received = RequestAttributes::new("POST", "Example.COM", 8080, "/items?draft=true");
        let received_hash = PayloadHasher::hash("application/json; charset=utf-8", algorithm, body);
        let authenticated = fx.server.authenticate(
            &received,
            &signed.authorization(),
            Some(received_hash.as_slice()),
        )?;
        assert_eq!(authenticated.artifacts.ext.as_deref(), Some("trace=abc"));

        let response_body = b"created";
        let response_hash = PayloadHasher::hash("text/plain", algorithm, response_body);
        let options = ResponseOptions {
            hash: Some(response_hash.as_slice()),
            ext: None,
        };
        let server_authorization = fx.server.response_header(&authenticated, &received, &options)?;

        let header = fx.client.authenticate_response(
            &request,
            &signed.artifacts,
            &server_authorization,
            Some(response_hash.as_slice()),
        )?;
        assert_eq!(header.hash.as_deref(), Some(&response_hash[..]));
        Ok(())
    }

    #[test]
    fn test_should_reject_response_signed_for_other_request() -> anyhow::Result<()> {
        let fx = fixture();
        let request = RequestAttributes::new("GET", "example.com", 443, "/resource");
        let first = fx.client.header(&request)?;
        let second = fx.client.header(&request)?;

        let authenticated = fx
            .server
            .authenticate(&request, &first.authorization(), None)?;
        let server_authorization =
            fx.server
                .response_header(&authenticated, &request, &ResponseOptions::default())?;

        let result = fx.client.authenticate_response(
            &request,
            &second.artifacts,
            &server_authorization,
            None,
        );
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_should_round_trip_through_http_types() -> anyhow::Result<()> {
        let fx = fixture();

        let mut outgoing = Request::get("https://api.example.com/v1/things?page=2").body(())?;
        let artifacts = sign_request(&fx.client, &mut outgoing, None)?;

        let (parts, ()) = Request::get("/v1/things?page=2")
            .header("host", "api.example.com")
            .header(AUTHORIZATION, outgoing.headers()[AUTHORIZATION].clone())
            .body(())?
            .into_parts();
        let authenticated = authenticate_parts(&fx.server, &parts, 443, None)
            .map_err(|rejection| anyhow::anyhow!("rejected: {:?}", rejection.error))?;

        let request = RequestAttributes::from_parts(&parts, 443)?;
        let value = fx
            .server
            .response_header(&authenticated, &request, &ResponseOptions::default())?;
        let response = Response::builder()
            .header(SERVER_AUTHORIZATION, HeaderValue::from_str(&value)?)
            .body(())?;

        let received = response.headers()[SERVER_AUTHORIZATION].to_str()?;
        fx.client.authenticate_response(&request, &artifacts, received, None)?;
        Ok(())
    }
}
