use crate::error::AppError;
use crate::services::{AuthRejection, AppState};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

/// Active user resolved from the request's bearer token.
///
/// Use `AuthenticatedUser` to require authentication and
/// `Option<AuthenticatedUser>` for routes that only personalise output.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

/// Outcome of authentication stored in request extensions
#[derive(Debug, Clone)]
enum AuthOutcome {
    Authenticated(AuthenticatedUser),
    Rejected(AuthRejection),
}

/// Bearer token from `Authorization: Bearer <token>`
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Actix middleware that resolves a bearer token to a user.
///
/// It never rejects a request itself: the outcome is recorded in request
/// extensions and the [`AuthenticatedUser`] extractor decides per route.
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let outcome = match bearer_token(&req) {
                None => AuthOutcome::Rejected(AuthRejection::MissingToken),
                Some(token) => match req.app_data::<web::Data<AppState>>().cloned() {
                    Some(state) => match state.auth.authenticate(&token).await {
                        Ok(user) => AuthOutcome::Authenticated(AuthenticatedUser {
                            id: user.id,
                            username: user.username,
                        }),
                        Err(rejection) => AuthOutcome::Rejected(rejection),
                    },
                    None => AuthOutcome::Rejected(AuthRejection::Unavailable(
                        "application state not registered".to_string(),
                    )),
                },
            };

            req.extensions_mut().insert(outcome);
            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<AuthOutcome>() {
            Some(AuthOutcome::Authenticated(user)) => Ok(user.clone()),
            Some(AuthOutcome::Rejected(rejection)) => Err(AppError::from(rejection.clone()).into()),
            None => Err(AppError::from(AuthRejection::MissingToken).into()),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::{RegisterInput, Stores};
    use crate::storage::MemoryBlobStore;
    use actix_web::{test, App, HttpResponse};
    use crypto_core::JwtKeys;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(
            Stores::memory(Arc::new(MemoryStore::new())),
            Arc::new(MemoryBlobStore::new("http://img.test", "")),
            JwtKeys::new("middleware-test-secret-32-bytes-long", 1).unwrap(),
            1024,
        )
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.username)
    }

    async fn maybe(user: Option<AuthenticatedUser>) -> HttpResponse {
        HttpResponse::Ok().body(user.map(|u| u.username).unwrap_or_else(|| "anonymous".into()))
    }

    #[actix_web::test]
    async fn test_required_and_optional_auth() {
        let state = state();
        let session = state
            .auth
            .register(RegisterInput {
                username: "tester".into(),
                email: "tester@example.com".into(),
                password: "secret1".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(BearerAuth)
                .route("/me", web::get().to(whoami))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", session.token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"tester"));

        let req = test::TestRequest::get().uri("/maybe").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"anonymous"));
    }
}
