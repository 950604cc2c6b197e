//! Deploy record parsing

/// Parsed contents of the `.deploys` file, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployHistory {
    commits: Vec<String>,
}

impl DeployHistory {
    /// Parse the record; blank lines are skipped and only the first
    /// whitespace-delimited field of each line is kept
    pub fn parse(contents: &str) -> Self {
        let commits = contents
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();
        Self { commits }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The n-th most recent deploy, 1-based: 1 is current, 2 is previous
    pub fn nth(&self, n: usize) -> Option<&str> {
        if n == 0 || n > self.commits.len() {
            return None;
        }
        self.commits
            .get(self.commits.len() - n)
            .map(String::as_str)
    }

    /// Most recent first, paired with a zero-based index
    pub fn listing(&self) -> Vec<(usize, &str)> {
        self.commits
            .iter()
            .rev()
            .enumerate()
            .map(|(index, commit)| (index, commit.as_str()))
            .collect()
    }
}
