mod helpers;
mod ipn;
mod mocks;
mod orders;

mod misc {
    use actix_web::{http::StatusCode, test::TestRequest};

    use super::helpers::send_request;
    use crate::routes::health;

    #[actix_web::test]
    async fn health_endpoint() {
        let (status, body) = send_request(TestRequest::get().uri("/health"), |cfg| {
            cfg.service(health);
        })
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "👍️\n");
    }
}
