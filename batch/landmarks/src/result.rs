//! 运行结果.

use std::io::{self, Write};

/// 数据集 landmarks 计算结果.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkResult {
    /// 数据集强度的最小、最大值.
    pub extremum: (f64, f64),
    /// 每个 landmark 对应的百分位.
    pub percentiles: Vec<f64>,
    /// 平均 landmarks.
    pub landmarks: Vec<f64>,
}

impl LandmarkResult {
    /// 将结果写进 `w` 中.
    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        const S4: &str = "    ";

        writeln!(w, "Dataset intensity range: [{:.6}, {:.6}]", self.extremum.0, self.extremum.1)?;
        writeln!(w, "Average landmarks:")?;
        for (p, l) in self.percentiles.iter().zip(self.landmarks.iter()) {
            writeln!(w, "{S4}{p:>6.2}%: {l:.6}")?;
        }
        Ok(())
    }

    /// 输出运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);
        match self.describe_into(&mut buf) {
            Ok(()) => print!("{}", String::from_utf8_lossy(&buf)),
            Err(e) => log::error!("cannot format the result: {e}"),
        }
        utils::sep();
    }
}

#[cfg(test)]
mod tests {
    use super::LandmarkResult;

    #[test]
    fn test_describe() {
        let r = LandmarkResult {
            extremum: (0.0, 10.0),
            percentiles: vec![2.0, 98.0],
            landmarks: vec![1.0, 9.5],
        };
        let mut buf = Vec::new();
        r.describe_into(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("[0.000000, 10.000000]"));
        assert!(s.contains("98.00%: 9.500000"));
    }
}
