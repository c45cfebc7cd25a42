/// Execution classes used to label spawned work in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// One in-flight paragraph analysis against the reasoning service.
	Analysis,
	/// Short auxiliary requests such as model listing or span explanations.
	Lookup,
	/// The long-lived session loop owning pipeline state.
	Session,
	/// Blocking filesystem work.
	FileIo,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Analysis => "analysis",
			Self::Lookup => "lookup",
			Self::Session => "session",
			Self::FileIo => "file_io",
		}
	}
}
