use actix_web::{error, web, HttpResponse, Result};
use log::warn;
use proptab::{
    check_satisfiable, check_tautology, engine::TableauStats, DecideErr, Limits, Outcome,
    Valuation, Verdict,
};
use serde::Serialize;

use crate::{config::ServerConfig, ParseForm};

#[derive(Serialize)]
struct TautologyResponse {
    formula: String,
    tautology: bool,
    countermodel: Option<Valuation>,
    stats: TableauStats,
}

#[derive(Serialize)]
struct SatisfiableResponse {
    formula: String,
    satisfiable: bool,
    model: Option<Valuation>,
    stats: TableauStats,
}

fn limits(config: &ServerConfig, params: Option<String>) -> Result<Limits> {
    let requested: Option<Limits> = match params {
        Some(p) => Some(serde_json::from_str(&p)?),
        None => None,
    };
    Ok(config.limits(requested))
}

/// Splits off the aborted case, which is answered with 422.
fn finished(outcome: Outcome) -> Result<(String, Option<Valuation>, TableauStats)> {
    let formula = outcome.formula.to_string();
    match outcome.verdict {
        Verdict::Aborted { steps } => {
            warn!("Search for {} aborted after {} steps", formula, steps);
            Err(error::ErrorUnprocessableEntity(DecideErr::Aborted(steps)))
        }
        Verdict::Unsatisfiable => Ok((formula, None, outcome.stats)),
        Verdict::Satisfiable { model } => Ok((formula, Some(model), outcome.stats)),
    }
}

pub(crate) async fn tautology(
    config: web::Data<ServerConfig>,
    form: web::Form<ParseForm>,
) -> Result<HttpResponse> {
    let ParseForm { formula, params } = form.into_inner();
    let limits = limits(&config, params)?;

    let outcome = check_tautology(&formula, limits).map_err(error::ErrorBadRequest)?;
    let (formula, countermodel, stats) = finished(outcome)?;

    Ok(HttpResponse::Ok().json(TautologyResponse {
        formula,
        tautology: countermodel.is_none(),
        countermodel,
        stats,
    }))
}

pub(crate) async fn satisfiable(
    config: web::Data<ServerConfig>,
    form: web::Form<ParseForm>,
) -> Result<HttpResponse> {
    let ParseForm { formula, params } = form.into_inner();
    let limits = limits(&config, params)?;

    let outcome = check_satisfiable(&formula, limits).map_err(error::ErrorBadRequest)?;
    let (formula, model, stats) = finished(outcome)?;

    Ok(HttpResponse::Ok().json(SatisfiableResponse {
        formula,
        satisfiable: model.is_some(),
        model,
        stats,
    }))
}
