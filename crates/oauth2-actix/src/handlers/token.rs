use actix_web::http::header::{HeaderValue, CACHE_CONTROL, PRAGMA};
use actix_web::{web, HttpRequest, HttpResponse};
use std::collections::{BTreeMap, HashSet};
use url::form_urlencoded;

use oauth2_core::OAuth2Error;
use oauth2_grants::TokenEndpoint;
use oauth2_observability::Metrics;

pub(crate) fn no_store_headers(mut resp: HttpResponse) -> HttpResponse {
    resp.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp.headers_mut()
        .insert(PRAGMA, HeaderValue::from_static("no-cache"));
    resp
}

fn ensure_no_duplicate_query_params(req: &HttpRequest) -> Result<(), OAuth2Error> {
    let mut seen: HashSet<String> = HashSet::new();
    for (k, _v) in form_urlencoded::parse(req.query_string().as_bytes()) {
        let key = k.into_owned();
        if !seen.insert(key) {
            return Err(OAuth2Error::invalid_request(
                "Duplicate query parameters are not allowed",
            ));
        }
    }
    Ok(())
}

fn parse_form_no_dupes(body: &[u8]) -> Result<BTreeMap<String, String>, OAuth2Error> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in form_urlencoded::parse(body) {
        let key = k.into_owned();
        if map.contains_key(&key) {
            return Err(OAuth2Error::invalid_request(
                "Duplicate form parameters are not allowed",
            ));
        }
        map.insert(key, v.into_owned());
    }
    Ok(map)
}

/// OAuth2 token endpoint.
///
/// Accepts an `application/x-www-form-urlencoded` body and hands it to the
/// [`TokenEndpoint`] pipeline. Errors render as RFC 6749 §5.2 JSON bodies.
pub async fn token(
    req: HttpRequest,
    body: web::Bytes,
    endpoint: web::Data<TokenEndpoint>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, OAuth2Error> {
    match issue(&req, &body, &endpoint).await {
        Ok((grant_type, response)) => {
            metrics.record_token_issued(&grant_type);
            Ok(no_store_headers(HttpResponse::Ok().json(response)))
        }
        Err(err) => {
            metrics.record_token_rejected(&err.error);
            Err(err)
        }
    }
}

async fn issue(
    req: &HttpRequest,
    body: &[u8],
    endpoint: &TokenEndpoint,
) -> Result<(String, oauth2_core::AccessResponse), OAuth2Error> {
    // Duplicate parameters make the request ambiguous.
    ensure_no_duplicate_query_params(req)?;
    let form = parse_form_no_dupes(body)?;

    let client_id = form
        .get("client_id")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OAuth2Error::invalid_request("Missing client_id"))?;

    let request = endpoint.new_access_request(&client_id, form).await?;
    let response = endpoint.new_access_response(&request).await?;

    tracing::info!(
        client_id = %client_id,
        grant_type = %request.grant_type(),
        request_id = %request.id,
        "access token issued"
    );

    Ok((request.grant_type().to_string(), response))
}
