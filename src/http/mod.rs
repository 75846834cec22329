mod content_type;

use anyhow::Result;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::get;
use graph::{Format, Graph};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::RuntimeConfig;
use crate::content::Catalog;
use crate::grapher::{Entity, Grapher, RenderContext};
use crate::store::ContentStore;

use self::content_type::Rdf;

pub(crate) async fn serve(config: &RuntimeConfig) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);
    let app = Router::new()
        .route("/places/{id}/{format}", get(get_place))
        .route("/places/{id}/{child}/{format}", get(get_place_child))
        .route("/vocabularies/{name}/{format}", get(get_vocabulary))
        .route("/vocabularies/{name}/{term}/{format}", get(get_term))
        .route("/authors/{format}", get(get_authors))
        .route("/authors/{user}/{format}", get(get_author))
        .layer(cors)
        .with_state(config.clone());
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.init.http.port)).await?;
    info!(target: "http", port = config.init.http.port, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// What a request asks to have rendered.
#[derive(Debug, Clone)]
enum Request {
    Place(String),
    /// A name or location of a place.
    Child { place: String, id: String },
    Vocabulary(String),
    Term { scheme: String, id: String },
    Authors,
    Author(String),
}

impl Request {
    fn filename(&self) -> String {
        match self {
            Request::Place(id) | Request::Vocabulary(id) | Request::Author(id) => id.clone(),
            Request::Child { id, .. } | Request::Term { id, .. } => id.clone(),
            Request::Authors => "authors".to_string(),
        }
    }
}

async fn get_place(
    State(config): State<RuntimeConfig>,
    Path((id, format)): Path<(String, String)>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Place(id), &format).await
}

async fn get_place_child(
    State(config): State<RuntimeConfig>,
    Path((place, id, format)): Path<(String, String, String)>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Child { place, id }, &format).await
}

async fn get_vocabulary(
    State(config): State<RuntimeConfig>,
    Path((name, format)): Path<(String, String)>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Vocabulary(name), &format).await
}

async fn get_term(
    State(config): State<RuntimeConfig>,
    Path((scheme, id, format)): Path<(String, String, String)>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Term { scheme, id }, &format).await
}

async fn get_authors(
    State(config): State<RuntimeConfig>,
    Path(format): Path<String>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Authors, &format).await
}

async fn get_author(
    State(config): State<RuntimeConfig>,
    Path((user, format)): Path<(String, String)>,
) -> Result<Rdf, StatusCode> {
    respond(config, Request::Author(user), &format).await
}

async fn respond(config: RuntimeConfig, request: Request, format: &str) -> Result<Rdf, StatusCode> {
    let Ok(format) = format.parse::<Format>() else {
        return Err(StatusCode::NOT_FOUND);
    };
    let name = request.filename();
    let body = spawn_blocking(move || -> Result<Option<String>> {
        let reader = ContentStore::new(config.keyspace.clone())?.reader();
        match render(&reader, &config.cx, &request)? {
            Some(g) => Ok(Some(g.serialize(format)?)),
            None => Ok(None),
        }
    })
    .await
    .map_err(|error| ise(error.into()))?
    .map_err(ise)?;
    match body {
        Some(body) => Ok(Rdf { body, format, name }),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// The graph for `request`, or None when it names nothing visible.
fn render<C: Catalog + ?Sized>(catalog: &C, cx: &RenderContext, request: &Request) -> Result<Option<Graph>> {
    let grapher = Grapher::new(catalog, cx);
    let g = match request {
        Request::Place(id) => match catalog.place(id)? {
            Some(place) if place.meta.is_published() => grapher.graph(Entity::Place(&place))?,
            _ => return Ok(None),
        },
        Request::Child { place, id } => {
            let Some(place) = catalog.place(place)?.filter(|p| p.meta.is_published()) else {
                return Ok(None);
            };
            let names = catalog.names(&place)?;
            let locations = catalog.locations(&place)?;
            if let Some(name) = names.iter().find(|n| &n.meta.id == id) {
                if !name.meta.is_published() {
                    return Ok(None);
                }
                grapher.graph(Entity::Name(name))?
            } else if let Some(location) = locations.iter().find(|l| &l.meta.id == id) {
                if !location.meta.is_published() {
                    return Ok(None);
                }
                grapher.graph(Entity::Location(location))?
            } else {
                return Ok(None);
            }
        }
        Request::Vocabulary(name) => return grapher.scheme(name),
        Request::Term { scheme, id } => grapher.graph(Entity::Term { scheme, id })?,
        Request::Authors => return Ok(Some(grapher.authors()?)),
        Request::Author(user) => grapher.graph(Entity::Person(user))?,
    };
    Ok(Some(g).filter(|g| !g.is_empty()))
}

fn ise(error: anyhow::Error) -> StatusCode {
    error!(target: "http", %error, "render failed");
    StatusCode::INTERNAL_SERVER_ERROR
}
