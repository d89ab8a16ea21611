use log::info;
use rouille::{Request, Response, input::post::PostError, post_input, router};
use serde::Deserialize;

use crate::{
    config::{HttpConfig, UploadLimits},
    domain::track::Track,
    http::error::ApiError,
    service::{
        index::{Media, NewTrack, TrackIndexService},
        metrics::MetricsService,
    },
};

pub struct HttpServer {
    metrics: MetricsService,
    index: TrackIndexService,
    pub config: HttpConfig,
    limits: UploadLimits,
}

impl HttpServer {
    pub fn new(
        metrics: MetricsService,
        index: TrackIndexService,
        config: HttpConfig,
        limits: UploadLimits,
    ) -> Self {
        Self {
            metrics,
            index,
            config,
            limits,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        info!("{} {}", request.method(), request.url());

        let response = if request.method() == "OPTIONS" {
            Response::empty_204()
        } else {
            self.route(request)
        };

        info!("Response: {} {}", request.method(), response.status_code);
        self.with_cors(response)
    }

    fn with_cors(&self, response: Response) -> Response {
        response
            .with_additional_header(
                "Access-Control-Allow-Origin",
                self.config.allowed_origin.clone(),
            )
            .with_additional_header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
            .with_additional_header("Access-Control-Allow-Headers", "Content-Type")
    }

    fn route(&self, request: &Request) -> Response {
        router!(request,
            (GET) (/api/tracks) => {
                self.handle_list_tracks()
            },

            (POST) (/api/upload) => {
                self.handle_upload(request)
            },

            (GET) (/api/metrics) => {
                self.handle_metrics(request)
            },

            (POST) (/api/tracks/{id: String}/play) => {
                self.handle_play(id)
            },

            (POST) (/api/tracks/{id: String}/like) => {
                self.handle_like(id, request)
            },

            _ => Response::empty_404()
        )
    }

    fn handle_list_tracks(&self) -> Response {
        match self.index.list_tracks() {
            Ok(tracks) => Response::json(&tracks),
            Err(e) => ApiError::from(e).into_response(),
        }
    }

    fn handle_metrics(&self, request: &Request) -> Response {
        let ids_param = request.get_param("ids").unwrap_or_default();
        let ids: Vec<String> = ids_param
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Response::json(&self.metrics.get_batch(&ids))
    }

    fn handle_play(&self, id: String) -> Response {
        match self.metrics.record_play(&id) {
            Ok(count) => Response::json(&count),
            Err(e) => ApiError::from(e).into_response(),
        }
    }

    fn handle_like(&self, id: String, request: &Request) -> Response {
        let body: LikeBody = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(_) => return ApiError::BadRequest("invalid json body".into()).into_response(),
        };

        match self.metrics.set_like(&id, &body.device, body.like) {
            Ok(count) => Response::json(&count),
            Err(e) => ApiError::from(e).into_response(),
        }
    }

    fn handle_upload(&self, request: &Request) -> Response {
        match self.upload(request) {
            Ok(track) => Response::json(&serde_json::json!({ "ok": true, "track": track })),
            Err(e) => e.into_response(),
        }
    }

    // form field names are the wire format
    #[allow(non_snake_case)]
    fn upload(&self, request: &Request) -> Result<Track, ApiError> {
        let input = post_input!(request, {
            audio: rouille::input::post::BufferedFile,
            cover: Option<rouille::input::post::BufferedFile>,
            title: String,
            artist: String,
            genre: Option<String>,
            tipAddress: Option<String>,
            uploader: Option<String>,
        })
        .map_err(|e| match e {
            PostError::WrongContentType => ApiError::BadRequest("Use multipart/form-data".into()),
            _ => ApiError::BadRequest("Missing required fields".into()),
        })?;

        if input.audio.data.len() > self.limits.max_audio_bytes {
            return Err(ApiError::PayloadTooLarge("Audio too large".into()));
        }
        if let Some(cover) = &input.cover {
            if cover.data.len() > self.limits.max_cover_bytes {
                return Err(ApiError::PayloadTooLarge("Cover too large".into()));
            }
        }

        let new = NewTrack {
            title: sanitize(&input.title),
            artist: sanitize(&input.artist),
            genre: sanitize(input.genre.as_deref().unwrap_or("")),
            uploader: sanitize(input.uploader.as_deref().unwrap_or("")),
            tip_address: sanitize(input.tipAddress.as_deref().unwrap_or("")),
            audio: Some(Media {
                content_type: media_type(input.audio.mime, "audio/mpeg"),
                bytes: input.audio.data,
            }),
            cover: input.cover.map(|cover| Media {
                content_type: media_type(cover.mime, "image/jpeg"),
                bytes: cover.data,
            }),
        };

        self.index.append_track(new).map_err(ApiError::from)
    }
}

fn media_type(mime: String, fallback: &str) -> String {
    if mime.is_empty() {
        fallback.to_string()
    } else {
        mime
    }
}

/// Strips control characters and angle brackets, truncates to 200 chars.
fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .take(200)
        .collect()
}

#[derive(Deserialize)]
struct LikeBody {
    #[serde(default)]
    device: String,
    #[serde(default)]
    like: bool,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
