use rocket::{serde::json::Json, Route, State};

use crate::{
    engine::Engine,
    error::{Result, TallyError},
    model::{
        common::ElectionId,
        election::Election,
        tally::{CandidateResult, TallyRow},
    },
};

pub fn routes() -> Vec<Route> {
    routes![active_elections, election, results, export]
}

/// Elections currently open for voting.
#[get("/elections")]
async fn active_elections(engine: &State<Engine>) -> Json<Vec<Election>> {
    Json(engine.active_elections())
}

#[get("/elections/<election_id>")]
async fn election(election_id: ElectionId, engine: &State<Engine>) -> Result<Json<Election>> {
    let election = engine
        .election(&election_id)
        .ok_or(TallyError::ElectionNotFound(election_id))?;
    Ok(Json(election))
}

#[get("/elections/<election_id>/results")]
async fn results(
    election_id: ElectionId,
    engine: &State<Engine>,
) -> Result<Json<Vec<CandidateResult>>> {
    Ok(Json(engine.results_for(&election_id)?))
}

#[get("/elections/<election_id>/export")]
async fn export(election_id: ElectionId, engine: &State<Engine>) -> Result<Json<Vec<TallyRow>>> {
    Ok(Json(engine.export_tally(&election_id)?))
}
