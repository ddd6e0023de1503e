use iced::{
    mouse, time,
    widget::{
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Subscription, Task,
    Theme,
};
use serde::Deserialize;
use std::time::Duration;
use sweepcore::spectrum::Snapshot;
use sweepcore::telemetry::TickCounters;

const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000/spectrum";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);
const DB_GRID_STEP: f32 = 10.0;
const FREQ_GRID_LINES: usize = 10;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Real-Time Spectrum Analyzer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(POLL_INTERVAL).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

fn bridge_url() -> String {
    std::env::var("SWEEP_BRIDGE_URL").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.into())
}

#[derive(Debug)]
struct Visualizer {
    url: String,
    payload: Option<SpectrumPayload>,
    in_flight: bool,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<SpectrumPayload, String>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let url = bridge_url();
        (
            Visualizer {
                url: url.clone(),
                payload: None,
                in_flight: true,
                status: format!("Waiting for spectrum from {url}..."),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(url), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick if state.in_flight => Task::none(),
            Message::Tick => {
                state.in_flight = true;
                Task::perform(fetch_payload(state.url.clone()), Message::PayloadFetched)
            }
            Message::PayloadFetched(Ok(payload)) => {
                state.in_flight = false;
                let previous = state
                    .payload
                    .as_ref()
                    .and_then(|p| p.snapshot.as_ref())
                    .map(|s| s.generation);
                let current = payload.snapshot.as_ref().map(|s| s.generation);
                if previous.is_none() && current.is_some() {
                    state.push_history("First spectrum received".into());
                }
                let status_changed = state
                    .payload
                    .as_ref()
                    .map_or(true, |p| p.status != payload.status);
                if status_changed {
                    state.push_history(format!("Driver: {}", payload.status));
                }
                state.status = describe(&payload);
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.in_flight = false;
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let counters = state
            .payload
            .as_ref()
            .map(|payload| payload.counters)
            .unwrap_or_default();

        let spectrum = Canvas::new(SpectrumPlot::from_payload(state.payload.as_ref()))
            .width(Length::Fill)
            .height(Length::Fill);

        let counter_column = column![
            text("Sweep counters").size(18),
            text(format!("Ticks: {}", counters.ticks)).size(13),
            text(format!("Applied: {}", counters.applied)).size(13),
            text(format!("Skipped: {}", counters.skipped)).size(13),
            text(format!("Idle: {}", counters.idle)).size(13),
            text(format!("Malformed: {}", counters.malformed)).size(13),
            text(format!("Out of range: {}", counters.out_of_range)).size(13),
        ]
        .spacing(4)
        .padding(6);

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let side_column = column![
            counter_column,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .width(Length::Fixed(240.0));

        let plot_column = column![
            text("Real-Time Spectrum Analyzer").size(26),
            text(&state.status).size(14),
            spectrum,
            text("Frequency (MHz)").size(14),
        ]
        .spacing(8)
        .width(Length::Fill)
        .align_x(Alignment::Center);

        let layout = row![plot_column, side_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn describe(payload: &SpectrumPayload) -> String {
    match &payload.snapshot {
        Some(snapshot) => {
            let peak = snapshot
                .peak()
                .map(|(freq, db)| format!("peak {:.1} dB @ {:.3} MHz", db, freq))
                .unwrap_or_else(|| "no peak".into());
            format!(
                "{} bins, {:.1}-{:.1} MHz, {} ({})",
                snapshot.len(),
                snapshot.axis.min_freq_mhz(),
                snapshot.axis.max_freq_mhz(),
                peak,
                payload.status
            )
        }
        None => format!("No spectrum yet ({})", payload.status),
    }
}

async fn fetch_payload(url: String) -> Result<SpectrumPayload, String> {
    let request = async {
        let response = reqwest::get(&url).await.map_err(|e| e.to_string())?;
        response
            .json::<SpectrumPayload>()
            .await
            .map_err(|e| e.to_string())
    };
    tokio::time::timeout(FETCH_TIMEOUT, request)
        .await
        .map_err(|_| format!("no answer from {url} within {FETCH_TIMEOUT:?}"))?
}

#[derive(Debug, Clone, Deserialize)]
struct SpectrumPayload {
    #[serde(default)]
    snapshot: Option<Snapshot>,
    plot_db_min: f32,
    plot_db_max: f32,
    #[serde(default)]
    counters: TickCounters,
    #[serde(default)]
    status: String,
}

/// Maps a (frequency, dB) sample into canvas pixels, clamping dB to the plot range.
fn plot_point(
    freq_mhz: f64,
    db: f32,
    freq_range: (f64, f64),
    db_range: (f32, f32),
    width: f32,
    height: f32,
) -> Point {
    let (freq_min, freq_max) = freq_range;
    let (db_min, db_max) = db_range;
    let x = ((freq_mhz - freq_min) / (freq_max - freq_min)) as f32 * width;
    let clamped = if db.is_nan() { db_min } else { db.clamp(db_min, db_max) };
    let y = height - (clamped - db_min) / (db_max - db_min) * height;
    Point::new(x, y)
}

#[derive(Clone)]
struct SpectrumPlot {
    snapshot: Option<Snapshot>,
    db_min: f32,
    db_max: f32,
}

impl SpectrumPlot {
    fn from_payload(payload: Option<&SpectrumPayload>) -> Self {
        match payload {
            Some(payload) => Self {
                snapshot: payload.snapshot.clone(),
                db_min: payload.plot_db_min,
                db_max: payload.plot_db_max,
            },
            None => Self {
                snapshot: None,
                db_min: -120.0,
                db_max: 0.0,
            },
        }
    }

    fn draw_grid(&self, frame: &mut Frame, bounds: Rectangle, freq_range: (f64, f64)) {
        let grid = Stroke::default()
            .with_width(1.0)
            .with_color(Color::from_rgb(0.2, 0.2, 0.25));
        let label = Color::from_rgb(0.6, 0.6, 0.65);

        let mut db = (self.db_min / DB_GRID_STEP).ceil() * DB_GRID_STEP;
        while db <= self.db_max {
            let y = plot_point(
                freq_range.0,
                db,
                freq_range,
                (self.db_min, self.db_max),
                bounds.width,
                bounds.height,
            )
            .y;
            frame.stroke(
                &Path::line(Point::new(0.0, y), Point::new(bounds.width, y)),
                grid.clone(),
            );
            frame.fill_text(canvas::Text {
                content: format!("{db:.0} dBFS"),
                position: Point::new(4.0, y - 14.0),
                color: label,
                size: Pixels(11.0),
                ..canvas::Text::default()
            });
            db += DB_GRID_STEP;
        }

        for step in 0..=FREQ_GRID_LINES {
            let fraction = step as f64 / FREQ_GRID_LINES as f64;
            let freq = freq_range.0 + (freq_range.1 - freq_range.0) * fraction;
            let x = fraction as f32 * bounds.width;
            frame.stroke(
                &Path::line(Point::new(x, 0.0), Point::new(x, bounds.height)),
                grid.clone(),
            );
            frame.fill_text(canvas::Text {
                content: format!("{freq:.0}"),
                position: Point::new(x + 2.0, bounds.height - 14.0),
                color: label,
                size: Pixels(11.0),
                ..canvas::Text::default()
            });
        }
    }
}

impl canvas::Program<Message> for SpectrumPlot {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let Some(snapshot) = &self.snapshot else {
            return vec![frame.into_geometry()];
        };
        if self.db_max <= self.db_min {
            return vec![frame.into_geometry()];
        }

        let freq_range = (snapshot.axis.min_freq_mhz(), snapshot.axis.max_freq_mhz());
        self.draw_grid(&mut frame, bounds, freq_range);

        if snapshot.len() > 1 {
            let path = Path::new(|builder| {
                for (i, (freq, db)) in snapshot.points().into_iter().enumerate() {
                    let point = plot_point(
                        freq,
                        db,
                        freq_range,
                        (self.db_min, self.db_max),
                        bounds.width,
                        bounds.height,
                    );
                    if i == 0 {
                        builder.move_to(point);
                    } else {
                        builder.line_to(point);
                    }
                }
            });

            frame.stroke(
                &path,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.18, 0.72, 0.89)),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_point_clamps_to_db_range() {
        let range = (6000.0, 6100.0);
        let db = (-120.0, 0.0);
        let top = plot_point(6050.0, 25.0, range, db, 200.0, 100.0);
        assert_eq!(top, Point::new(100.0, 0.0));
        let bottom = plot_point(6000.0, -300.0, range, db, 200.0, 100.0);
        assert_eq!(bottom, Point::new(0.0, 100.0));
        let mid = plot_point(6100.0, -60.0, range, db, 200.0, 100.0);
        assert_eq!(mid, Point::new(200.0, 50.0));
    }

    #[test]
    fn payload_decodes_bridge_json() {
        let json = r#"{
            "snapshot": {
                "axis": {"min_freq_mhz": 6000.0, "max_freq_mhz": 6003.0, "bin_width_mhz": 1.0},
                "amplitudes_db": [-120.0, -80.5, -120.0],
                "generation": 1
            },
            "plot_db_min": -120.0,
            "plot_db_max": 0.0,
            "counters": {"ticks": 2, "applied": 1, "skipped": 1, "idle": 0, "malformed": 0, "out_of_range": 0},
            "status": "sweeping"
        }"#;
        let payload: SpectrumPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.counters.applied, 1);
        assert!(describe(&payload).contains("peak -80.5 dB @ 6001.000 MHz"));
    }

    #[test]
    fn payload_with_empty_bins_still_decodes() {
        let json = r#"{
            "snapshot": {
                "axis": {"min_freq_mhz": 6000.0, "max_freq_mhz": 6003.0, "bin_width_mhz": 1.0},
                "amplitudes_db": [null, -80.5, null],
                "generation": 2
            },
            "plot_db_min": -120.0,
            "plot_db_max": 0.0
        }"#;
        let payload: SpectrumPayload = serde_json::from_str(json).unwrap();
        let snapshot = payload.snapshot.as_ref().unwrap();
        assert!(snapshot.amplitudes_db[0].is_nan());
        assert!(describe(&payload).contains("peak -80.5 dB @ 6001.000 MHz"));

        let floor = plot_point(
            6000.0,
            snapshot.amplitudes_db[0],
            (6000.0, 6003.0),
            (-120.0, 0.0),
            300.0,
            100.0,
        );
        assert_eq!(floor, Point::new(0.0, 100.0));
    }
}
