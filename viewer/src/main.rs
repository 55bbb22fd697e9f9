use cbircore::remote::{SearchComparisonClient, VisualizationClient};
use cbircore::session::VisualizationTicket;
use cbircore::view::{project, QueryPanel, RankedPanel, VisualizationPanel};
use cbircore::{
    ClientError, ClientResult, CollectionStatus, ComparisonResult, QuerySubmission,
    ServiceConfig, SessionController, SessionStatus, SessionToken, VisualizationAsset,
};
use iced::{
    widget::{button, column, image, row, scrollable, text, text_input, Column, Container},
    Alignment, Element, Length, Task, Theme,
};

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Workbench::boot, Workbench::update, Workbench::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Workbench) -> String {
    "CBIR Comparison Workbench".into()
}

fn application_theme(_: &Workbench) -> Theme {
    Theme::Light
}

struct Workbench {
    config: ServiceConfig,
    compare_client: SearchComparisonClient,
    viz_client: VisualizationClient,
    controller: SessionController,
    path_input: String,
    plot: Option<image::Handle>,
    collection: Option<CollectionStatus>,
    status_line: String,
}

#[derive(Debug, Clone)]
enum Message {
    PathChanged(String),
    Submit,
    ComparisonFinished(SessionToken, ClientResult<ComparisonResult>),
    VisualizationFetched(VisualizationTicket, ClientResult<VisualizationAsset>),
    CollectionStatusFetched(ClientResult<CollectionStatus>),
}

impl Workbench {
    fn boot() -> (Self, Task<Message>) {
        let config = ServiceConfig::from_env();
        let compare_client = SearchComparisonClient::new(config.clone());
        let viz_client = VisualizationClient::new(config.clone());
        let (controller, boot_ticket) = SessionController::new();

        let boot_plot = {
            let client = viz_client.clone();
            Task::perform(async move { client.fetch().await }, move |outcome| {
                Message::VisualizationFetched(boot_ticket, outcome)
            })
        };
        let boot_status = {
            let client = viz_client.clone();
            Task::perform(
                async move { client.collection_status().await },
                Message::CollectionStatusFetched,
            )
        };

        (
            Workbench {
                config,
                compare_client,
                viz_client,
                controller,
                path_input: String::new(),
                plot: None,
                collection: None,
                status_line: "Waiting for the retrieval service...".into(),
            },
            Task::batch([boot_plot, boot_status]),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::PathChanged(value) => {
                state.path_input = value;
                Task::none()
            }
            Message::Submit => state.submit_query(),
            Message::ComparisonFinished(token, outcome) => {
                match state.controller.finish_comparison(token, outcome) {
                    Some(ticket) => {
                        state.status_line = "Results in, refreshing plot...".into();
                        let client = state.viz_client.clone();
                        Task::perform(async move { client.fetch().await }, move |outcome| {
                            Message::VisualizationFetched(ticket, outcome)
                        })
                    }
                    None => {
                        if state.controller.session().status == SessionStatus::Failed {
                            state.status_line = state
                                .controller
                                .session()
                                .error
                                .as_ref()
                                .map(|error| error.message())
                                .unwrap_or_else(|| "search failed".into());
                        }
                        Task::none()
                    }
                }
            }
            Message::VisualizationFetched(ticket, outcome) => {
                state.controller.finish_visualization(ticket, outcome);
                state.plot = state
                    .controller
                    .visualization()
                    .map(|asset| image::Handle::from_bytes(asset.png_bytes().to_vec()));
                if state.controller.session().status == SessionStatus::Settled {
                    state.status_line = "Search settled.".into();
                }
                Task::none()
            }
            Message::CollectionStatusFetched(Ok(status)) => {
                state.collection = Some(status);
                Task::none()
            }
            Message::CollectionStatusFetched(Err(error)) => {
                log::warn!("collection status fetch failed: {error}");
                Task::none()
            }
        }
    }

    fn submit_query(&mut self) -> Task<Message> {
        let Some(submission) = QuerySubmission::from_picker(&self.path_input) else {
            // A cancelled picker yields no handle; not an error.
            self.status_line = "Select a query image first.".into();
            return Task::none();
        };
        if !submission.path.is_file() {
            self.status_line = format!("{} is not a readable file.", submission.path.display());
            return Task::none();
        }

        let token = self.controller.begin_query(&submission.path);
        self.status_line = format!("Analyzing {}...", submission.file_name());
        let client = self.compare_client.clone();
        Task::perform(
            async move {
                let bytes = tokio::fs::read(&submission.path).await.map_err(|err| {
                    ClientError::NetworkUnavailable(format!(
                        "could not read {}: {err}",
                        submission.path.display()
                    ))
                })?;
                client.compare(&submission.file_name(), bytes).await
            },
            move |outcome| Message::ComparisonFinished(token, outcome),
        )
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let model = project(&state.controller, &state.config);

        let collection_line = match &state.collection {
            Some(status) if status.is_empty => text("Indexed collection: empty").size(14),
            Some(status) => {
                text(format!("Indexed collection: {} vectors", status.vector_count)).size(14)
            }
            None => text("Indexed collection: unknown").size(14),
        };

        let preview = match &model.query {
            QueryPanel::Busy { preview } | QueryPanel::Comparison { preview, .. } => {
                preview.clone()
            }
            _ => None,
        };
        let preview_section: Element<'_, Message> = match preview {
            Some(path) => column![
                text("Query Image").size(16),
                image(image::Handle::from_path(&path)).width(Length::Fill),
            ]
            .spacing(4)
            .into(),
            None => column![].into(),
        };

        let plot_section: Element<'_, Message> = match &model.visualization {
            VisualizationPanel::Ready { stale_note, .. } => {
                let mut section = Column::new()
                    .spacing(4)
                    .push(text("Vector Space Visualization").size(16));
                if let Some(handle) = &state.plot {
                    section = section.push(image(handle.clone()).width(Length::Fill));
                }
                if let Some(note) = stale_note {
                    section = section.push(text(note.clone()).size(12));
                }
                section.into()
            }
            VisualizationPanel::Pending => column![
                text("Vector Space Visualization").size(16),
                text("Loading plot...").size(14),
            ]
            .spacing(4)
            .into(),
            VisualizationPanel::Unavailable { message } => column![
                text("Vector Space Visualization").size(16),
                text(format!("Plot unavailable: {message}")).size(14),
            ]
            .spacing(4)
            .into(),
        };

        let query_column = column![
            text("Content-Based Image Retrieval").size(26),
            text("LSH indexing vs brute force search").size(14),
            collection_line,
            text_input("Path to query image", &state.path_input)
                .on_input(Message::PathChanged)
                .on_submit(Message::Submit)
                .padding(6),
            button("Run comparison").on_press(Message::Submit).padding(10),
            text(&state.status_line).size(14),
            preview_section,
            plot_section,
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        let results_section: Element<'_, Message> = match &model.query {
            QueryPanel::Prompt => text("Upload an image to start search.").size(14).into(),
            QueryPanel::Busy { .. } => text("Analyzing image...").size(14).into(),
            QueryPanel::Failure { message } => {
                text(format!("Search failed: {message}")).size(14).into()
            }
            QueryPanel::Comparison {
                approximate, exact, ..
            } => column![ranked_section(approximate), ranked_section(exact)]
                .spacing(16)
                .into(),
        };

        let results_column = column![
            text("Search Results").size(26),
            Container::new(scrollable(results_section).height(Length::Fill)).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![query_column, results_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn ranked_section(panel: &RankedPanel) -> Element<'static, Message> {
    let header = text(format!("{}: {:.2}ms", panel.label, panel.elapsed_ms)).size(18);
    let entries = if panel.items.is_empty() {
        Column::new().push(text("No matches returned").size(12))
    } else {
        panel
            .items
            .iter()
            .fold(Column::new().spacing(4), |col, item| {
                let mut card = Column::new().push(text(format!("ID: {}", item.id)).size(14));
                if let Some(url) = &item.image_url {
                    card = card.push(text(url.clone()).size(11));
                }
                col.push(card)
            })
    };
    column![header, entries].spacing(6).into()
}
