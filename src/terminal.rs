// Copyright (c) 2026 n0cturne

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::alphabet::is_wide;
use crate::cell::{Cell, Weight};
use crate::frame::Frame;

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); len],
        }
    }
}

/// Raw-mode session guard plus the diffed cell flush. Pointer capture and
/// focus reporting are only negotiated when the cursor pair mounts, so a
/// `--no-cursor` run leaves the terminal's mouse protocol alone.
pub struct Terminal {
    stdout: Stdout,
    pointer: bool,
    last: Option<LastFrame>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
}

impl Terminal {
    pub fn new(capture_pointer: bool) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            if capture_pointer {
                out.execute(event::EnableMouseCapture)?;
                let _ = out.execute(event::EnableFocusChange);
            }
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            pointer: capture_pointer,
            last: None,
            run_buf: {
                let mut s = String::new();
                s.reserve(64);
                s
            },
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let mut cur_fg: Option<Color> = None;
        let mut cur_bg: Option<Color> = None;
        let mut cur_weight = Weight::Normal;
        let mut cur_pos: Option<(u16, u16)> = None;

        let needs_full_redraw = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);

        if needs_full_redraw {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
        }

        let can_reuse_last = !needs_full_redraw && self.last.is_some();
        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_count = frame.dirty_indices().len();
        let dirty_is_large = total_cells > 0 && dirty_count >= (total_cells / 3);
        let do_full_redraw = !can_reuse_last || frame.is_dirty_all() || dirty_is_large;

        if do_full_redraw {
            let needs_new_last = self
                .last
                .as_ref()
                .map(|l| l.width != frame.width || l.height != frame.height)
                .unwrap_or(true);
            if needs_new_last {
                self.last = Some(LastFrame::new(frame.width, frame.height));
            }
            let last = self.last.as_mut().expect("set above");

            for y in 0..frame.height {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                // A wide glyph covers its right neighbor; that cell is
                // recorded but never printed, or the row would shear.
                let mut occluded = false;
                for x in 0..frame.width {
                    let idx = y as usize * frame.width as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    last.cells[idx] = cell;

                    if occluded {
                        occluded = false;
                        continue;
                    }

                    if cell.fg != cur_fg {
                        if let Some(fg) = cell.fg {
                            self.stdout.queue(SetForegroundColor(fg))?;
                        } else {
                            self.stdout.queue(SetForegroundColor(Color::Reset))?;
                        }
                        cur_fg = cell.fg;
                    }

                    if cell.bg != cur_bg {
                        if let Some(bg) = cell.bg {
                            self.stdout.queue(SetBackgroundColor(bg))?;
                        } else {
                            self.stdout.queue(SetBackgroundColor(Color::Reset))?;
                        }
                        cur_bg = cell.bg;
                    }

                    if cell.weight != cur_weight {
                        queue_weight(&mut self.stdout, cur_weight, cell.weight)?;
                        cur_weight = cell.weight;
                    }

                    self.stdout.queue(Print(cell.ch))?;
                    occluded = is_wide(cell.ch);
                }
            }

            self.stdout.queue(SetAttribute(Attribute::Reset))?;
            self.stdout.queue(ResetColor)?;
            self.stdout.flush()?;

            frame.clear_dirty();
            return Ok(());
        }

        let last = self.last.as_mut().expect("checked above");

        let dirty = frame.dirty_indices();
        let width_usize = frame.width as usize;
        let run_buf = &mut self.run_buf;

        if self.row_dirty.len() != frame.height as usize {
            self.row_dirty = vec![Vec::new(); frame.height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in dirty {
            let y = (idx / width_usize) as u16;
            if y >= frame.height {
                continue;
            }
            let b = &mut self.row_dirty[y as usize];
            if b.is_empty() {
                self.touched_rows.push(y);
            }
            b.push(idx);
        }

        self.touched_rows.sort_unstable();
        self.touched_rows.dedup();

        for y0 in self.touched_rows.iter().copied() {
            let b = &mut self.row_dirty[y0 as usize];
            if b.len() > 1 {
                b.sort_unstable();
            }
            let mut i = 0usize;
            while i < b.len() {
                let idx0 = b[i];
                let cell0 = frame.cell_at_index(idx0);
                if last.cells.get(idx0).copied() == Some(cell0) {
                    i += 1;
                    continue;
                }

                last.cells[idx0] = cell0;

                let x0 = (idx0 % width_usize) as u16;
                let fg0 = cell0.fg;
                let bg0 = cell0.bg;
                let weight0 = cell0.weight;

                run_buf.clear();
                run_buf.push(cell0.ch);
                // Cells consumed on screen, counting wide glyphs twice.
                let wide0 = is_wide(cell0.ch) && (idx0 + 1) % width_usize != 0;
                let mut run_len: u16 = if wide0 { 2 } else { 1 };
                let mut last_idx_in_run = if wide0 { idx0 + 1 } else { idx0 };
                let mut j = i + 1;
                if wide0 {
                    if let Some(c) = last.cells.get_mut(idx0 + 1) {
                        *c = frame.cell_at_index(idx0 + 1);
                    }
                    if j < b.len() && b[j] == idx0 + 1 {
                        j += 1;
                    }
                }

                while j < b.len() {
                    let idx1 = b[j];
                    if idx1 != last_idx_in_run + 1 {
                        break;
                    }

                    let cell1 = frame.cell_at_index(idx1);
                    if last.cells.get(idx1).copied() == Some(cell1) {
                        break;
                    }
                    if cell1.fg != fg0 || cell1.bg != bg0 || cell1.weight != weight0 {
                        break;
                    }

                    run_buf.push(cell1.ch);
                    last.cells[idx1] = cell1;
                    j += 1;

                    let wide1 = is_wide(cell1.ch) && (idx1 + 1) % width_usize != 0;
                    if wide1 {
                        run_len = run_len.saturating_add(2);
                        last_idx_in_run = idx1 + 1;
                        if let Some(c) = last.cells.get_mut(idx1 + 1) {
                            *c = frame.cell_at_index(idx1 + 1);
                        }
                        if j < b.len() && b[j] == idx1 + 1 {
                            j += 1;
                        }
                    } else {
                        run_len = run_len.saturating_add(1);
                        last_idx_in_run = idx1;
                    }
                }

                if cur_pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }

                if fg0 != cur_fg {
                    if let Some(fg) = fg0 {
                        self.stdout.queue(SetForegroundColor(fg))?;
                    } else {
                        self.stdout.queue(SetForegroundColor(Color::Reset))?;
                    }
                    cur_fg = fg0;
                }

                if bg0 != cur_bg {
                    if let Some(bg) = bg0 {
                        self.stdout.queue(SetBackgroundColor(bg))?;
                    } else {
                        self.stdout.queue(SetBackgroundColor(Color::Reset))?;
                    }
                    cur_bg = bg0;
                }

                if weight0 != cur_weight {
                    queue_weight(&mut self.stdout, cur_weight, weight0)?;
                    cur_weight = weight0;
                }

                self.stdout.queue(Print(run_buf.as_str()))?;
                let next_x = x0.saturating_add(run_len);
                cur_pos = if next_x < frame.width {
                    Some((next_x, y0))
                } else {
                    None
                };

                i = j;
            }
            b.clear();
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

/// Intensity attributes do not stack; leaving bold or dim means clearing
/// intensity first.
fn queue_weight(out: &mut Stdout, from: Weight, to: Weight) -> Result<()> {
    if from != Weight::Normal {
        out.queue(SetAttribute(Attribute::NormalIntensity))?;
    }
    match to {
        Weight::Bold => {
            out.queue(SetAttribute(Attribute::Bold))?;
        }
        Weight::Dim => {
            out.queue(SetAttribute(Attribute::Dim))?;
        }
        Weight::Normal => {}
    }
    Ok(())
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.pointer {
            let _ = self.stdout.execute(event::DisableMouseCapture);
            let _ = self.stdout.execute(event::DisableFocusChange);
        }
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

/// Signal-path teardown: undoes every mode `Terminal::new` may have set,
/// whether or not it got that far.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(event::DisableFocusChange);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
