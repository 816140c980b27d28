//! 质控结果的输出: 控制台摘要, JSON 与制表符分隔的表格.

use ct_phantom::measure::Outcome;
use ct_phantom::{PhantomReport, PhantomResult};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const S4: &str = "    ";

/// 表格的列.
const HEADER: [&str; 8] = [
    "series", "module", "label", "value", "unit", "verdict", "excess", "error",
];

/// 序列的显示名称: 优先使用描述信息, 否则使用目录名.
fn series_name(dir: &Path, report: Option<&PhantomReport>) -> String {
    report
        .and_then(|r| r.series.description.clone())
        .unwrap_or_else(|| {
            dir.file_name()
                .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned())
        })
}

/// 将单个序列的结果写进 `w` 中.
fn describe_into<W: Write>(
    dir: &Path,
    r: &PhantomResult<PhantomReport>,
    w: &mut W,
) -> io::Result<()> {
    let report = match r {
        Ok(report) => report,
        Err(e) => {
            writeln!(w, "Series `{}`:", dir.display())?;
            return write!(w, "{S4}Analysis failed: {e}");
        }
    };

    writeln!(w, "Series `{}`:", series_name(dir, Some(report)))?;
    for rec in report.landmarks.iter() {
        writeln!(
            w,
            "{S4}{} at slice #{} (location {:.2} mm), {:?}",
            rec.module,
            rec.slice_index,
            rec.location,
            rec.geometry()
        )?;
    }
    for m in report.records() {
        let total = m.entries().len();
        let failed = m.failures().count();
        let rejected = m
            .entries()
            .iter()
            .filter_map(|e| e.outcome.reading())
            .filter(|r| r.passed() == Some(false))
            .count();
        writeln!(
            w,
            "{S4}{}: {total} entries, {failed} failed, {rejected} out of tolerance",
            m.module()
        )?;
    }
    for (module, label, e) in report.failures() {
        writeln!(w, "{S4}{S4}{module} / {label}: {e}")?;
    }
    write!(w, "{S4}All passed: {}", report.all_passed())
}

/// 一次运行的最终结果, 保持输入顺序.
pub struct QaResult {
    data: Vec<(PathBuf, PhantomResult<PhantomReport>)>,
}

impl QaResult {
    pub fn from_iter<I: IntoIterator<Item = (PathBuf, PhantomResult<PhantomReport>)>>(
        it: I,
    ) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析失败的序列数.
    pub fn failed_series(&self) -> usize {
        self.data.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// 在控制台打印结果.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        utils::sep_to(&mut out)?;
        for (dir, r) in self.data.iter() {
            describe_into(dir, r, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }
        Ok(())
    }

    /// 将所有序列写成 JSON 数组, 与输入顺序一一对应.
    /// 分析失败的序列写成 `{"series": ..., "error": ...}`.
    pub fn write_json<W: Write>(&self, w: W) -> anyhow::Result<()> {
        let items = self
            .data
            .iter()
            .map(|(dir, r)| match r {
                Ok(report) => serde_json::to_value(report),
                Err(e) => Ok(serde_json::json!({
                    "series": series_name(dir, None),
                    "error": e.to_string()
                })),
            })
            .collect::<serde_json::Result<Vec<_>>>()?;
        serde_json::to_writer_pretty(w, &items)?;
        Ok(())
    }

    /// 将所有测量项写成制表符分隔的表格, 每项一行.
    /// 分析失败的序列只占一行, 仅填写 `error` 列.
    pub fn write_table<W: Write>(&self, w: W) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(w);
        wtr.write_record(HEADER)?;

        for (dir, r) in self.data.iter() {
            let report = match r {
                Ok(report) => report,
                Err(e) => {
                    let name = series_name(dir, None);
                    let msg = e.to_string();
                    wtr.write_record([name.as_str(), "", "", "", "", "", "", msg.as_str()])?;
                    continue;
                }
            };
            let name = series_name(dir, Some(report));
            for (module, entry) in report.entries() {
                let row = match &entry.outcome {
                    Outcome::Measured(reading) => [
                        name.clone(),
                        module.to_string(),
                        entry.label.clone(),
                        reading.value.to_string(),
                        reading.unit.to_string(),
                        reading.verdict.map(|v| v.to_string()).unwrap_or_default(),
                        reading.excess.map(|x| x.to_string()).unwrap_or_default(),
                        String::new(),
                    ],
                    Outcome::Failed(e) => [
                        name.clone(),
                        module.to_string(),
                        entry.label.clone(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        e.to_string(),
                    ],
                };
                wtr.write_record(&row)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    /// 在 `dir` 下写出 `report.json` 和 `report.tsv`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> anyhow::Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.write_json(io::BufWriter::new(std::fs::File::create(dir.join("report.json"))?))?;
        self.write_table(std::fs::File::create(dir.join("report.tsv"))?)?;
        Ok(())
    }
}
