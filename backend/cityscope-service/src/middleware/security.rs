use actix_web::middleware::DefaultHeaders;

/// Hardening headers added to every response that does not already set them
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_headers_present_on_success_and_error() {
        let app = test::init_service(
            App::new()
                .wrap(security_headers())
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/gone", web::get().to(|| async { HttpResponse::NotFound().finish() })),
        )
        .await;

        for uri in ["/ok", "/gone"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            let headers = resp.headers();
            assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
            assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
            assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
            assert_eq!(
                headers.get("cross-origin-resource-policy").unwrap(),
                "same-origin"
            );
        }
    }
}
