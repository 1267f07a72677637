use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use spin_agents::Backfill;
use spin_core::*;
use spin_database::*;
use spin_lobby::*;
use spin_records::Match;

#[derive(serde::Deserialize)]
pub struct CreateIn {
    pub stake: Chips,
    pub players: usize,
}

#[derive(serde::Deserialize)]
pub struct MatchIn {
    pub match_id: uuid::Uuid,
}

#[derive(serde::Deserialize)]
pub struct RequestIn {
    pub stake: Chips,
    pub players: usize,
}

/// Identity arrives from the external auth collaborator as a positive
/// numeric `X-User-Id` header.
pub fn caller(req: &HttpRequest) -> Result<Caller, HttpResponse> {
    req.headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|&id| id > 0)
        .map(|id| Caller::Human(UserId(id)))
        .ok_or_else(|| HttpResponse::Unauthorized().body("missing or invalid X-User-Id"))
}

/// One HTTP status per error variant.
pub fn fail(e: MatchError) -> HttpResponse {
    match &e {
        MatchError::Validation(_) => HttpResponse::BadRequest().body(e.to_string()),
        MatchError::InsufficientFunds => HttpResponse::BadRequest().body(e.to_string()),
        MatchError::Authorization(_) => HttpResponse::Forbidden().body(e.to_string()),
        MatchError::Conflict(_) => HttpResponse::Conflict().body(e.to_string()),
        MatchError::NotFound => HttpResponse::NotFound().body(e.to_string()),
        MatchError::Unavailable(_) => HttpResponse::ServiceUnavailable().body(e.to_string()),
        MatchError::Settlement(_) | MatchError::Database(_) => {
            log::error!("[http] internal failure: {}", e);
            HttpResponse::InternalServerError().body("internal error")
        }
    }
}

pub async fn create(
    lobby: web::Data<Lobby>,
    filler: web::Data<Backfill>,
    body: web::Json<CreateIn>,
    req: HttpRequest,
) -> impl Responder {
    let caller = match caller(&req) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };
    match lobby.create_or_join(caller, body.stake, body.players).await {
        Ok((summary, joined)) => {
            // Best-effort immediate fill; the grace window makes this a
            // no-op for fresh matches.
            if let Err(e) = filler.backfill(summary.match_id).await {
                log::warn!("[http] backfill after create failed: {}", e);
            }
            HttpResponse::Ok().json(serde_json::json!({
                "match": summary,
                "joined": joined,
            }))
        }
        Err(e) => fail(e),
    }
}

pub async fn roll(
    lobby: web::Data<Lobby>,
    body: web::Json<MatchIn>,
    req: HttpRequest,
) -> impl Responder {
    let caller = match caller(&req) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };
    match lobby.roll(caller, ID::from(body.match_id)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => fail(e),
    }
}

pub async fn forfeit(
    lobby: web::Data<Lobby>,
    body: web::Json<MatchIn>,
    req: HttpRequest,
) -> impl Responder {
    let caller = match caller(&req) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };
    match lobby.forfeit(caller, ID::from(body.match_id)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => fail(e),
    }
}

pub async fn abandon(
    lobby: web::Data<Lobby>,
    body: web::Json<MatchIn>,
    req: HttpRequest,
) -> impl Responder {
    let caller = match caller(&req) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };
    match lobby.abandon(caller, ID::from(body.match_id)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => fail(e),
    }
}

/// Idempotent poll; also the hook that promotes full WAITING matches and
/// runs the turn timeout check.
pub async fn check(lobby: web::Data<Lobby>, query: web::Query<MatchIn>) -> impl Responder {
    match lobby.check_status(ID::from(query.match_id)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => fail(e),
    }
}

/// Stake catalog for the client UI.
pub async fn stakes(db: web::Data<Db>) -> impl Responder {
    let rules = async {
        let client = db.conn().await?;
        client.stake_rules().await
    }
    .await;
    match rules {
        Ok(rules) => HttpResponse::Ok().json(rules),
        Err(e) => {
            log::error!("[http] stake catalog failed: {}", e);
            HttpResponse::InternalServerError().body("internal error")
        }
    }
}

/// Read-only preflight: can this caller afford this stake?
pub async fn request(
    db: web::Data<Db>,
    body: web::Json<RequestIn>,
    req: HttpRequest,
) -> impl Responder {
    let caller = match caller(&req) {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };
    let answer = async {
        let client = db.conn().await?;
        let rule = client.stake_rule(body.stake, body.players).await?;
        let account = client.account(caller.id()).await?;
        Ok::<_, PgErr>((rule, account))
    }
    .await;
    match answer {
        Ok((Some(rule), Some(account))) => HttpResponse::Ok().json(serde_json::json!({
            "entry_fee": rule.entry_fee,
            "winner_payout": rule.winner_payout,
            "label": rule.label,
            "balance": account.balance,
            "affordable": account.can_afford(rule.entry_fee),
        })),
        Ok((None, _)) => HttpResponse::BadRequest().body("no such stake rule"),
        Ok((_, None)) => HttpResponse::NotFound().body("no such account"),
        Err(e) => {
            log::error!("[http] preflight failed: {}", e);
            HttpResponse::InternalServerError().body("internal error")
        }
    }
}

pub async fn subscribe(
    lobby: web::Data<Lobby>,
    path: web::Path<uuid::Uuid>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let id: ID<Match> = ID::from(path.into_inner());
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            super::bridge(lobby.get_ref().clone(), id, session, stream);
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
