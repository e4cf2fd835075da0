use rocket::{serde::json::Json, Route, State};

use crate::{
    engine::Engine,
    error::Result,
    model::{
        api::{
            auth::BearerToken,
            vote::{ClientOrigin, VoteRequest},
        },
        common::ElectionId,
        vote::VoteReceipt,
    },
};

pub fn routes() -> Vec<Route> {
    routes![vote, has_voted, voted_elections]
}

#[post("/voter/elections/<election_id>/vote", data = "<ballot>", format = "json")]
async fn vote(
    token: BearerToken,
    origin: ClientOrigin,
    election_id: ElectionId,
    ballot: Json<VoteRequest>,
    engine: &State<Engine>,
) -> Result<Json<VoteReceipt>> {
    let VoteRequest {
        candidate_id,
        biometric_verified,
    } = ballot.into_inner();
    let receipt = engine.cast_vote(
        token.as_str(),
        &election_id,
        &candidate_id,
        origin.with_biometric(biometric_verified),
    )?;
    Ok(Json(receipt))
}

#[get("/voter/elections/<election_id>/voted")]
async fn has_voted(
    token: BearerToken,
    election_id: ElectionId,
    engine: &State<Engine>,
) -> Result<Json<bool>> {
    Ok(Json(engine.has_voted(token.as_str(), &election_id)?))
}

#[get("/voter/elections")]
async fn voted_elections(token: BearerToken, engine: &State<Engine>) -> Result<Json<Vec<ElectionId>>> {
    Ok(Json(engine.voted_elections(token.as_str())?))
}
