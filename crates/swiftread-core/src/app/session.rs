impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    /// Stop playback and lock controls until [`Self::finish_ingestion`].
    pub fn begin_ingestion(&mut self) {
        self.stop();
        self.ingesting = true;
        self.pending_redraw = true;
        debug!("ingest: controls locked");
    }

    /// Install a freshly loaded document, or keep the current one when
    /// loading failed.
    pub fn finish_ingestion(
        &mut self,
        result: Result<Document, IngestionError>,
    ) -> Result<(), IngestionError> {
        self.ingesting = false;
        self.pending_redraw = true;

        let document = match result {
            Ok(document) => document,
            Err(err) => {
                warn!("ingest: keeping current document: {err}");
                return Err(err);
            }
        };

        self.install_document(document, 0);
        self.request_save(SaveReason::DocumentLoaded);
        Ok(())
    }

    fn install_document(&mut self, document: Document, word_index: usize) {
        self.stop();
        self.pending_save = None;
        self.document = document;
        self.current_word_index = word_index.min(self.document.total_words());
        self.page = PageView::default();
        if self.view_mode == ViewMode::Paginated {
            self.sync_page_view();
        }
        self.pending_redraw = true;
    }

    /// Capture the current state for persistence.
    ///
    /// Plain text documents store no structure; it is rebuilt from the text.
    pub fn snapshot_session(&self, saved_at_ms: u64) -> Session {
        let structure = &self.document.structure;
        let (current_chapter_index, scroll_percentage) = match self.view_mode {
            ViewMode::Paginated => (self.page.chapter_index, self.page.scroll_percentage),
            ViewMode::WordAtATime => {
                let chapter_index = chapter_at(structure, self.current_word_index);
                let scroll = structure.chapters.get(chapter_index).map_or(0.0, |chapter| {
                    chapter_progress(chapter, self.current_word_index)
                });
                (chapter_index, scroll)
            }
        };

        Session {
            document_text: self.document.text.clone(),
            current_word_index: self.current_word_index,
            total_words: self.document.total_words(),
            view_mode: self.view_mode,
            current_chapter_index,
            scroll_percentage,
            document_structure: match self.document.source {
                DocumentSource::Structured => Some(structure.clone()),
                DocumentSource::PlainText => None,
            },
            settings: self.settings.clone(),
            saved_at_ms,
        }
    }

    /// Restore a saved session. Nothing changes unless every part of it is
    /// usable.
    pub fn restore_session(&mut self, session: Session) -> Result<(), RestoreError> {
        let document = stage_document(&session)?;
        let settings = session.settings.clamped();

        self.install_document(document, session.current_word_index);
        self.pending_save = None;
        self.timing = TimingParams::from(&settings);
        self.settings = settings;
        self.view_mode = session.view_mode;
        if self.view_mode == ViewMode::Paginated {
            self.sync_page_view();
        }
        info!(
            "session: restored at={} words={} mode={:?}",
            self.current_word_index,
            self.document.total_words(),
            self.view_mode
        );
        Ok(())
    }
}

fn stage_document(session: &Session) -> Result<Document, RestoreError> {
    match &session.document_structure {
        Some(structure) => {
            let mut structure = structure.clone();
            if structure.chapters.is_empty() && session.document_text.trim().is_empty() {
                return Err(RestoreError::EmptyDocument);
            }
            if !structure.validate() {
                warn!("session: stored structure failed validation");
                return Err(RestoreError::BrokenStructure);
            }
            structure.rehydrate();
            let document = Document::from_structure(structure);
            if document.total_words() == 0 {
                warn!("session: stored structure holds no words");
                return Err(RestoreError::EmptyDocument);
            }
            if document.total_words() != session.total_words {
                warn!(
                    "session: stored words={} rebuilt words={}",
                    session.total_words,
                    document.total_words()
                );
                return Err(RestoreError::BrokenStructure);
            }
            Ok(document)
        }
        None => {
            if session.document_text.trim().is_empty() {
                return Err(RestoreError::EmptyDocument);
            }
            Ok(Document::plain(&session.document_text))
        }
    }
}
