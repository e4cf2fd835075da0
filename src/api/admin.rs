use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    engine::Engine,
    error::{Error, Result, TallyError},
    model::{
        api::auth::Authenticated,
        common::{Admin, ElectionId, ElectionStatus, IdentityId, Observer},
        election::Election,
        tally::{AdminStats, ElectionDetails},
    },
    scheduler::{ElectionScheduler, Transition},
};

pub fn routes() -> Vec<Route> {
    routes![stats, election_details, verify_identity, open_election, close_election]
}

#[get("/admin/stats")]
async fn stats(_token: Authenticated<Observer>, engine: &State<Engine>) -> Result<Json<AdminStats>> {
    Ok(Json(engine.admin_stats()?))
}

#[get("/admin/elections/<election_id>")]
async fn election_details(
    _token: Authenticated<Observer>,
    election_id: ElectionId,
    engine: &State<Engine>,
) -> Result<Json<ElectionDetails>> {
    Ok(Json(engine.election_details(&election_id)?))
}

#[post("/admin/identities/<identity_id>/verify")]
async fn verify_identity(
    _token: Authenticated<Admin>,
    identity_id: IdentityId,
    engine: &State<Engine>,
) -> Result<Status> {
    if engine.verify_identity(&identity_id)? {
        Ok(Status::Ok)
    } else {
        Err(Error::not_found(format!("Identity {identity_id}")))
    }
}

#[post("/admin/elections/<election_id>/open")]
async fn open_election(
    _token: Authenticated<Admin>,
    election_id: ElectionId,
    engine: &State<Engine>,
    scheduler: &State<ElectionScheduler>,
) -> Result<Json<Election>> {
    transition(engine, scheduler, election_id, Transition::Open).await
}

#[post("/admin/elections/<election_id>/close")]
async fn close_election(
    _token: Authenticated<Admin>,
    election_id: ElectionId,
    engine: &State<Engine>,
    scheduler: &State<ElectionScheduler>,
) -> Result<Json<Election>> {
    transition(engine, scheduler, election_id, Transition::Close).await
}

/// Apply a transition straight away and return the election as it now stands.
async fn transition(
    engine: &Engine,
    scheduler: &ElectionScheduler,
    election_id: ElectionId,
    transition: Transition,
) -> Result<Json<Election>> {
    let status = scheduler
        .apply_now(&election_id, transition)
        .await
        .ok_or_else(|| TallyError::ElectionNotFound(election_id.clone()))?;
    if transition == Transition::Open && status == ElectionStatus::Completed {
        return Err(Error::Status(
            Status::Conflict,
            format!("Election {election_id} has already closed"),
        ));
    }
    let election = engine
        .election(&election_id)
        .ok_or(TallyError::ElectionNotFound(election_id))?;
    Ok(Json(election))
}
