use actix_web::{error, web, HttpResponse, Responder, Result};
use log::warn;
use proptab::{
    calculi::tableau::{Move, Params, State, StepTableau, TableauErr},
    Calculus, Limits,
};

use crate::{config::ServerConfig, MoveForm, ParseForm, StateForm};

fn move_err(e: TableauErr) -> error::Error {
    match e {
        TableauErr::Aborted(_) => error::ErrorUnprocessableEntity(e),
        _ => error::ErrorBadRequest(e),
    }
}

/// Replaying a history (undo, validate) re-runs its auto moves, so each of
/// them must fit under the server's cap.
fn check_history(config: &ServerConfig, state: &State) -> Result<()> {
    for m in state.moves() {
        if let Move::Auto { max_steps } = *m {
            if config.limits(Some(Limits { max_steps })).max_steps != max_steps {
                warn!("Rejected state with auto move {} over the step cap", m);
                return Err(error::ErrorUnprocessableEntity(format!(
                    "Move {} exceeds the step cap of this server",
                    m
                )));
            }
        }
    }
    Ok(())
}

pub(crate) async fn tableau() -> impl Responder {
    HttpResponse::Ok().body(
        "Calculus tableau loaded.
Interact via the /parse /move /close and /validate endpoints"
            .to_string(),
    )
}

pub(crate) async fn parse(form: web::Form<ParseForm>) -> Result<HttpResponse> {
    let ParseForm { formula, params } = form.into_inner();
    let params: Option<Params> = match params {
        Some(p) => Some(serde_json::from_str(&p)?),
        None => None,
    };

    let state = StepTableau::parse_formula(&formula, params).map_err(error::ErrorBadRequest)?;

    Ok(HttpResponse::Ok().json(state))
}

pub(crate) async fn validate(
    config: web::Data<ServerConfig>,
    form: web::Form<StateForm>,
) -> Result<HttpResponse> {
    let StateForm { state } = form.into_inner();

    let state: State = serde_json::from_str(&state)?;
    check_history(&config, &state)?;
    let res = StepTableau::validate(state);

    Ok(HttpResponse::Ok().json(res))
}

pub(crate) async fn r#move(
    config: web::Data<ServerConfig>,
    form: web::Form<MoveForm>,
) -> Result<HttpResponse> {
    let MoveForm { state, r#move } = form.into_inner();

    let state: State = serde_json::from_str(&state)?;
    check_history(&config, &state)?;
    let r#move = match serde_json::from_str::<Move>(&r#move)? {
        Move::Auto { max_steps } => Move::Auto {
            max_steps: config.limits(Some(Limits { max_steps })).max_steps,
        },
        m => m,
    };

    let state = StepTableau::apply_move(state, r#move).map_err(move_err)?;

    Ok(HttpResponse::Ok().json(state))
}

pub(crate) async fn close(form: web::Form<StateForm>) -> Result<HttpResponse> {
    let StateForm { state } = form.into_inner();

    let state: State = serde_json::from_str(&state)?;
    let res = StepTableau::check_close(state);

    Ok(HttpResponse::Ok().json(res))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::Value;

    use crate::config::ServerConfig;

    macro_rules! app {
        () => {
            app!(ServerConfig::default())
        };
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($config))
                    .configure(crate::routes),
            )
            .await
        };
    }

    fn capped(max_steps: usize) -> ServerConfig {
        ServerConfig {
            max_steps: Some(max_steps),
            ..ServerConfig::default()
        }
    }

    #[actix_web::test]
    async fn proof_session() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/tableau/parse")
            .set_form([("formula", "(P|~P)")])
            .to_request();
        let mut state: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("not", state["tree"][0]["branch"][0]["type"]);
        assert_eq!(Value::Bool(false), state["tree"][0]["isClosed"]);

        for m in [
            r#"{"type":"expand","branchID":0}"#,
            r#"{"type":"expand","branchID":0}"#,
            r#"{"type":"close","branchID":0}"#,
        ] {
            let req = test::TestRequest::post()
                .uri("/tableau/move")
                .set_form([("state", state.to_string().as_str()), ("move", m)])
                .to_request();
            state = test::call_and_read_body_json(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/tableau/validate")
            .set_form([("state", state.to_string())])
            .to_request();
        let valid: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(Value::Bool(true), valid);

        let req = test::TestRequest::post()
            .uri("/tableau/close")
            .set_form([("state", state.to_string())])
            .to_request();
        let msg: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(Value::Bool(true), msg["closed"]);
    }

    #[actix_web::test]
    async fn invalid_move() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/tableau/parse")
            .set_form([("formula", "P")])
            .to_request();
        let state: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/tableau/move")
            .set_form([
                ("state", state.to_string().as_str()),
                ("move", r#"{"type":"expand","branchID":3}"#),
            ])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[actix_web::test]
    async fn auto_respects_step_cap() {
        let app = app!(capped(5));

        let req = test::TestRequest::post()
            .uri("/tableau/parse")
            .set_form([
                ("formula", "((A|B)&((C|D)&((E|F)&(G|H))))"),
                ("params", r#"{"mode":"SATISFIABILITY"}"#),
            ])
            .to_request();
        let state: Value = test::call_and_read_body_json(&app, req).await;

        for m in [r#"{"type":"auto"}"#, r#"{"type":"auto","maxSteps":1000}"#] {
            let req = test::TestRequest::post()
                .uri("/tableau/move")
                .set_form([("state", state.to_string().as_str()), ("move", m)])
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, res.status());
        }
    }

    #[actix_web::test]
    async fn auto_records_server_cap() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/tableau/parse")
            .set_form([("formula", "(P|~P)")])
            .to_request();
        let state: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/tableau/move")
            .set_form([
                ("state", state.to_string().as_str()),
                ("move", r#"{"type":"auto"}"#),
            ])
            .to_request();
        let state: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(100_000, state["moveHistory"][0]["maxSteps"]);

        // a server with a tighter cap refuses to replay that history
        let strict = app!(capped(5));
        let req = test::TestRequest::post()
            .uri("/tableau/validate")
            .set_form([("state", state.to_string())])
            .to_request();
        let res = test::call_service(&strict, req).await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, res.status());

        let req = test::TestRequest::post()
            .uri("/tableau/validate")
            .set_form([("state", state.to_string())])
            .to_request();
        let valid: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(Value::Bool(true), valid);
    }

    #[actix_web::test]
    async fn parse_error() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/tableau/parse")
            .set_form([("formula", "(P&Q")])
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }
}
